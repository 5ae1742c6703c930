use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub const INT: &str = "int";
pub const FLOAT: &str = "float";
pub const NUM: &str = "num";
pub const STR: &str = "str";
pub const BOOL: &str = "bool";
pub const TRUE: &str = "true";
pub const FALSE: &str = "false";
pub const NULL: &str = "null";
pub const ARRAY: &str = "array";
pub const RECORD: &str = "record";

/// Abstract value domain the synthesizer reasons over.
///
/// `Singleton` carries number literals and `PreciseString` carries string
/// literals; both widen to their nominal type under [`Type::promote`].
/// Arrays are `Generic(Nominal("array"), element)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Type {
    Top,
    Bottom,
    Singleton(Value),
    PreciseString(String),
    Nominal(String),
    Generic(Box<Type>, Box<Type>),
    Union(Vec<Type>),
    FiniteRecord(BTreeMap<String, Type>),
    Var(String),
}

impl Type {
    pub fn top() -> Type {
        Type::Top
    }

    pub fn bottom() -> Type {
        Type::Bottom
    }

    pub fn nominal(name: impl Into<String>) -> Type {
        Type::Nominal(name.into())
    }

    pub fn int() -> Type {
        Type::nominal(INT)
    }

    pub fn float() -> Type {
        Type::nominal(FLOAT)
    }

    pub fn string() -> Type {
        Type::nominal(STR)
    }

    pub fn bool() -> Type {
        Type::nominal(BOOL)
    }

    pub fn null() -> Type {
        Type::nominal(NULL)
    }

    pub fn var(name: impl Into<String>) -> Type {
        Type::Var(name.into())
    }

    pub fn array_of(element: Type) -> Type {
        Type::Generic(Box::new(Type::nominal(ARRAY)), Box::new(element))
    }

    pub fn record<K: Into<String>>(fields: impl IntoIterator<Item = (K, Type)>) -> Type {
        Type::FiniteRecord(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn union(types: impl IntoIterator<Item = Type>) -> Type {
        Type::Union(types.into_iter().collect()).normalize()
    }

    /// The most precise type of a raw literal.
    pub fn wrap(value: &Value) -> Type {
        match value {
            Value::Null => Type::null(),
            Value::Bool(true) => Type::nominal(TRUE),
            Value::Bool(false) => Type::nominal(FALSE),
            Value::Number(_) => Type::Singleton(value.clone()),
            Value::String(s) => Type::PreciseString(s.clone()),
            Value::Array(items) => Type::array_of(Type::union(items.iter().map(Type::wrap))),
            Value::Object(map) => {
                Type::FiniteRecord(map.iter().map(|(k, v)| (k.clone(), Type::wrap(v))).collect())
            }
        }
    }

    /// The nominal type a literal belongs to, ignoring its exact value.
    pub fn general_type_of(value: &Value) -> Type {
        match value {
            Value::Null => Type::null(),
            Value::Bool(_) => Type::bool(),
            Value::Number(n) => {
                if n.is_i64() || n.is_u64() {
                    Type::int()
                } else {
                    Type::float()
                }
            }
            Value::String(_) => Type::string(),
            Value::Array(items) => {
                Type::array_of(Type::union(items.iter().map(Type::general_type_of)))
            }
            Value::Object(map) => Type::FiniteRecord(
                map.iter()
                    .map(|(k, v)| (k.clone(), Type::general_type_of(v)))
                    .collect(),
            ),
        }
    }

    pub fn is_bottom(&self) -> bool {
        matches!(self, Type::Bottom)
    }

    /// Widens literal-valued types to their general nominal type.
    pub fn promote(&self) -> Type {
        match self {
            Type::Singleton(value) => Type::general_type_of(value),
            Type::PreciseString(_) => Type::string(),
            Type::Generic(base, param) => {
                Type::Generic(Box::new(base.promote()), Box::new(param.promote()))
            }
            Type::Union(items) => Type::union(items.iter().map(Type::promote)),
            Type::FiniteRecord(fields) => Type::FiniteRecord(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.promote()))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    pub fn normalize(self) -> Type {
        match self {
            Type::Generic(base, param) => {
                Type::Generic(Box::new(base.normalize()), Box::new(param.normalize()))
            }
            Type::FiniteRecord(fields) => Type::FiniteRecord(
                fields.into_iter().map(|(k, v)| (k, v.normalize())).collect(),
            ),
            Type::Union(items) => normalize_union(items),
            other => other,
        }
    }

    /// Subtyping over the lattice. Shape pairs without a rule compare as
    /// `false` so that pruning stays conservative.
    pub fn is_subtype_of(&self, super_type: &Type) -> bool {
        if self == super_type {
            return true;
        }

        match (self, super_type) {
            (Type::Bottom, _) => true,
            (_, Type::Top) => true,
            (Type::Top, _) => false,
            (_, Type::Bottom) => false,
            (Type::Union(items), sup) => items.iter().all(|item| item.is_subtype_of(sup)),
            (sub, Type::Union(items)) => items.iter().any(|item| sub.is_subtype_of(item)),
            (Type::Singleton(value), sup) => Type::general_type_of(value).is_subtype_of(sup),
            (Type::PreciseString(_), sup) => Type::string().is_subtype_of(sup),
            (Type::Nominal(a), Type::Nominal(b)) => nominal_extends(a, b),
            (Type::Generic(base, _), Type::Nominal(_)) => base.is_subtype_of(super_type),
            (Type::Generic(sub_base, sub_param), Type::Generic(sup_base, sup_param)) => {
                sub_base.is_subtype_of(sup_base) && sub_param.is_subtype_of(sup_param)
            }
            (Type::FiniteRecord(_), Type::Nominal(name)) => name == RECORD,
            (Type::FiniteRecord(sub), Type::FiniteRecord(sup)) => record_subtype(sub, sup),
            (Type::Var(a), Type::Var(b)) => a == b,
            _ => false,
        }
    }

    /// The single value inhabiting this type, if the type pins one down.
    pub fn exact_literal(&self) -> Option<Value> {
        match self {
            Type::Singleton(value) => Some(value.clone()),
            Type::PreciseString(s) => Some(Value::String(s.clone())),
            Type::Nominal(name) => match name.as_str() {
                TRUE => Some(Value::Bool(true)),
                FALSE => Some(Value::Bool(false)),
                NULL => Some(Value::Null),
                _ => None,
            },
            Type::FiniteRecord(fields) => {
                let mut map = serde_json::Map::new();
                for (key, ty) in fields {
                    map.insert(key.clone(), ty.exact_literal()?);
                }
                Some(Value::Object(map))
            }
            _ => None,
        }
    }

    pub fn is_int_like(&self) -> bool {
        !self.is_bottom() && self.promote().is_subtype_of(&Type::int())
    }

    pub fn is_string_like(&self) -> bool {
        !self.is_bottom() && self.promote().is_subtype_of(&Type::string())
    }

    /// Element type when this is an array type.
    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Type::Generic(base, param) if base.as_ref() == &Type::nominal(ARRAY) => Some(param),
            _ => None,
        }
    }

    /// The catalog key used to look up methods on a receiver of this type.
    pub fn nominal_key(&self) -> Option<String> {
        match self {
            Type::Singleton(value) => Type::general_type_of(value).nominal_key(),
            Type::PreciseString(_) => Some(STR.to_string()),
            Type::Nominal(name) => Some(name.clone()),
            Type::Generic(base, _) => base.nominal_key(),
            Type::FiniteRecord(_) => Some(RECORD.to_string()),
            _ => None,
        }
    }

    pub fn contains_vars(&self) -> bool {
        match self {
            Type::Var(_) => true,
            Type::Generic(base, param) => base.contains_vars() || param.contains_vars(),
            Type::Union(items) => items.iter().any(Type::contains_vars),
            Type::FiniteRecord(fields) => fields.values().any(Type::contains_vars),
            _ => false,
        }
    }

    /// Replaces every type variable with `binding`.
    pub fn substitute_vars(&self, binding: &Type) -> Type {
        match self {
            Type::Var(_) => binding.clone(),
            Type::Generic(base, param) => Type::Generic(
                Box::new(base.substitute_vars(binding)),
                Box::new(param.substitute_vars(binding)),
            ),
            Type::Union(items) => Type::union(items.iter().map(|t| t.substitute_vars(binding))),
            Type::FiniteRecord(fields) => Type::FiniteRecord(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.substitute_vars(binding)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    fn stable_key(&self) -> String {
        match self {
            Type::Top => "top".to_string(),
            Type::Bottom => "bottom".to_string(),
            Type::Singleton(value) => format!("singleton<{value}>"),
            Type::PreciseString(s) => format!("precise<{s:?}>"),
            Type::Nominal(name) => format!("nominal<{name}>"),
            Type::Generic(base, param) => {
                format!("generic<{},{}>", base.stable_key(), param.stable_key())
            }
            Type::Union(items) => {
                let mut keys: Vec<String> = items.iter().map(Type::stable_key).collect();
                keys.sort();
                format!("union({})", keys.join("|"))
            }
            Type::FiniteRecord(fields) => {
                let parts = fields
                    .iter()
                    .map(|(k, v)| format!("{k}:{}", v.stable_key()))
                    .collect::<Vec<_>>()
                    .join(",");
                format!("record{{{parts}}}")
            }
            Type::Var(name) => format!("var<{name}>"),
        }
    }
}

pub fn subtype(a: &Type, b: &Type) -> bool {
    a.is_subtype_of(b)
}

pub fn promote(t: &Type) -> Type {
    t.promote()
}

fn nominal_parent(name: &str) -> Option<&'static str> {
    match name {
        INT | FLOAT => Some(NUM),
        TRUE | FALSE => Some(BOOL),
        _ => None,
    }
}

fn nominal_extends(sub: &str, sup: &str) -> bool {
    let mut current = Some(sub);
    while let Some(name) = current {
        if name == sup {
            return true;
        }
        current = nominal_parent(name);
    }
    false
}

fn record_subtype(sub: &BTreeMap<String, Type>, sup: &BTreeMap<String, Type>) -> bool {
    sup.iter().all(|(key, super_ty)| {
        sub.get(key)
            .is_some_and(|sub_ty| sub_ty.is_subtype_of(super_ty))
    })
}

fn normalize_union(items: Vec<Type>) -> Type {
    let mut flattened = Vec::new();
    for item in items {
        match item.normalize() {
            Type::Bottom => {}
            Type::Top => return Type::Top,
            Type::Union(inner) => flattened.extend(inner),
            other => flattened.push(other),
        }
    }

    let mut by_key = BTreeMap::new();
    for item in flattened {
        by_key.entry(item.stable_key()).or_insert(item);
    }
    let values: Vec<Type> = by_key.into_values().collect();

    let mut pruned = Vec::new();
    for (i, item) in values.iter().enumerate() {
        let subsumed = values
            .iter()
            .enumerate()
            .any(|(j, other)| i != j && item.is_subtype_of(other) && !other.is_subtype_of(item));
        if !subsumed {
            pruned.push(item.clone());
        }
    }

    let mut keyset = BTreeSet::new();
    pruned.retain(|item| keyset.insert(item.stable_key()));
    pruned.sort_by_key(Type::stable_key);

    match pruned.len() {
        0 => Type::Bottom,
        1 => pruned.pop().unwrap_or(Type::Bottom),
        _ => Type::Union(pruned),
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Top => write!(f, "Top"),
            Type::Bottom => write!(f, "Bottom"),
            Type::Singleton(value) => write!(f, "{value}"),
            Type::PreciseString(s) => write!(f, "{}", Value::String(s.clone())),
            Type::Nominal(name) => write!(f, "{name}"),
            Type::Generic(base, param) => write!(f, "{base}<{param}>"),
            Type::Union(items) => {
                let text = items
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" | ");
                write!(f, "{text}")
            }
            Type::FiniteRecord(fields) => {
                let text = fields
                    .iter()
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{{{text}}}")
            }
            Type::Var(name) => write!(f, "'{name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ARRAY, Type};
    use serde_json::json;

    #[test]
    fn singleton_sits_below_its_nominal_type() {
        let five = Type::wrap(&json!(5));
        assert!(five.is_subtype_of(&Type::int()));
        assert!(five.is_subtype_of(&Type::nominal("num")));
        assert!(!five.is_subtype_of(&Type::string()));
        assert!(!Type::int().is_subtype_of(&five));
    }

    #[test]
    fn singleton_equality_tracks_literal_shape() {
        let int_one = Type::wrap(&json!(1));
        let float_one = Type::wrap(&json!(1.0));
        assert_ne!(int_one, float_one);
        assert!(!int_one.is_subtype_of(&float_one));
        assert!(float_one.is_subtype_of(&Type::float()));
    }

    #[test]
    fn bottom_and_top_bound_everything() {
        let samples = vec![
            Type::int(),
            Type::wrap(&json!("abc")),
            Type::array_of(Type::string()),
            Type::record([("a", Type::int())]),
            Type::var("T"),
            Type::union(vec![Type::int(), Type::string()]),
        ];
        for ty in samples {
            assert!(Type::Bottom.is_subtype_of(&ty), "Bottom <= {ty}");
            assert!(ty.is_subtype_of(&Type::Top), "{ty} <= Top");
            assert!(ty.is_subtype_of(&ty), "{ty} <= {ty}");
        }
    }

    #[test]
    fn union_requires_every_member() {
        let mixed = Type::union(vec![Type::wrap(&json!(1)), Type::wrap(&json!("x"))]);
        assert!(!mixed.is_subtype_of(&Type::int()));
        assert!(mixed.is_subtype_of(&Type::union(vec![Type::int(), Type::string()])));
    }

    #[test]
    fn records_use_width_and_depth_subtyping() {
        let wide = Type::record([("a", Type::wrap(&json!(1))), ("b", Type::string())]);
        let narrow = Type::record([("a", Type::int())]);
        assert!(wide.is_subtype_of(&narrow));
        assert!(!narrow.is_subtype_of(&wide));
        assert!(wide.is_subtype_of(&Type::nominal("record")));
    }

    #[test]
    fn generic_is_covariant_and_below_its_base() {
        let ints = Type::array_of(Type::int());
        assert!(Type::wrap(&json!([1, 2])).is_subtype_of(&ints));
        assert!(ints.is_subtype_of(&Type::nominal(ARRAY)));
        assert!(!ints.is_subtype_of(&Type::array_of(Type::string())));
    }

    #[test]
    fn unknown_shape_pairs_fail_closed() {
        assert!(!Type::var("T").is_subtype_of(&Type::int()));
        assert!(!Type::int().is_subtype_of(&Type::var("T")));
        assert!(!Type::record([("a", Type::int())]).is_subtype_of(&Type::array_of(Type::Top)));
    }

    #[test]
    fn promote_widens_literals_only() {
        assert_eq!(Type::wrap(&json!(3)).promote(), Type::int());
        assert_eq!(Type::wrap(&json!("hi")).promote(), Type::string());
        assert_eq!(
            Type::wrap(&json!(["a", "b"])).promote(),
            Type::array_of(Type::string())
        );
        assert_eq!(Type::int().promote(), Type::int());
    }

    #[test]
    fn union_normalizes_and_drops_subsumed_members() {
        let ty = Type::union(vec![
            Type::wrap(&json!(2)),
            Type::int(),
            Type::Bottom,
            Type::union(vec![Type::string()]),
        ]);
        assert_eq!(ty, Type::union(vec![Type::string(), Type::int()]));
        assert_eq!(Type::union(Vec::new()), Type::Bottom);
        assert_eq!(Type::union(vec![Type::int(), Type::Top]), Type::Top);
    }

    #[test]
    fn exact_literal_recovers_pinned_values() {
        assert_eq!(Type::wrap(&json!("k")).exact_literal(), Some(json!("k")));
        assert_eq!(Type::wrap(&json!(true)).exact_literal(), Some(json!(true)));
        assert_eq!(
            Type::wrap(&json!({"a": 1})).exact_literal(),
            Some(json!({"a": 1}))
        );
        assert_eq!(Type::int().exact_literal(), None);
    }

    #[test]
    fn substitute_vars_instantiates_parametric_returns() {
        let ret = Type::array_of(Type::var("T"));
        assert_eq!(ret.substitute_vars(&Type::int()), Type::array_of(Type::int()));
        assert!(ret.contains_vars());
    }
}
