use crate::synth::types::{ARRAY, BOOL, FALSE, FLOAT, INT, NULL, NUM, RECORD, STR, TRUE, Type};
use rand::Rng;
use rand::prelude::SliceRandom;
use serde_json::{Map, Number, Value};

/// Samples a concrete value inhabiting `ty`. Returns `None` for types with
/// no known inhabitant (`Bottom`, type variables, unknown nominals).
pub fn generate_value(ty: &Type, rng: &mut impl Rng, max_depth: usize) -> Option<Value> {
    match ty {
        Type::Bottom | Type::Var(_) => None,
        Type::Top => {
            let mut choices = vec![Type::null(), Type::bool(), Type::int(), Type::string()];
            if max_depth > 0 {
                choices.push(Type::array_of(Type::Top));
                choices.push(Type::nominal(RECORD));
            }
            let choice = choices.choose(rng)?.clone();
            generate_value(&choice, rng, max_depth)
        }
        Type::Singleton(value) => Some(value.clone()),
        Type::PreciseString(s) => Some(Value::String(s.clone())),
        Type::Nominal(name) => generate_nominal(name, rng, max_depth),
        Type::Generic(..) => {
            let element = ty.element_type()?;
            if max_depth == 0 || element.is_bottom() {
                return Some(Value::Array(Vec::new()));
            }
            let len = rng.gen_range(0..=3);
            let mut items = Vec::with_capacity(len);
            for _ in 0..len {
                items.push(generate_value(element, rng, max_depth - 1)?);
            }
            Some(Value::Array(items))
        }
        Type::Union(items) => {
            let choices: Vec<&Type> = items.iter().filter(|item| !item.is_bottom()).collect();
            let choice = *choices.choose(rng)?;
            generate_value(choice, rng, max_depth)
        }
        Type::FiniteRecord(fields) => {
            let mut map = Map::new();
            for (key, field_ty) in fields {
                map.insert(
                    key.clone(),
                    generate_value(field_ty, rng, max_depth.saturating_sub(1))?,
                );
            }
            Some(Value::Object(map))
        }
    }
}

fn generate_nominal(name: &str, rng: &mut impl Rng, max_depth: usize) -> Option<Value> {
    match name {
        INT => Some(Value::from(rng.gen_range(-100i64..=100))),
        FLOAT => {
            let whole: i32 = rng.gen_range(-100..=100);
            Number::from_f64(f64::from(whole) + 0.5).map(Value::Number)
        }
        NUM => {
            let pick = if rng.gen_bool(0.5) { INT } else { FLOAT };
            generate_nominal(pick, rng, max_depth)
        }
        STR => {
            let len = rng.gen_range(0..=8);
            Some(Value::String(
                (0..len)
                    .map(|_| (b'a' + rng.gen_range(0..26)) as char)
                    .collect(),
            ))
        }
        BOOL => Some(Value::Bool(rng.gen_bool(0.5))),
        TRUE => Some(Value::Bool(true)),
        FALSE => Some(Value::Bool(false)),
        NULL => Some(Value::Null),
        ARRAY => generate_value(&Type::array_of(Type::Top), rng, max_depth),
        RECORD => {
            let mut map = Map::new();
            if max_depth > 0 {
                for i in 0..rng.gen_range(0..=2) {
                    map.insert(
                        format!("field_{i}"),
                        generate_value(&Type::Top, rng, max_depth - 1)?,
                    );
                }
            }
            Some(Value::Object(map))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::generate_value;
    use crate::synth::types::Type;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn uninhabited_types_generate_nothing() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(generate_value(&Type::Bottom, &mut rng, 3), None);
        assert_eq!(generate_value(&Type::var("T"), &mut rng, 3), None);
        assert_eq!(generate_value(&Type::nominal("widget"), &mut rng, 3), None);
    }

    #[test]
    fn generated_values_fit_type() {
        let types = vec![
            Type::int(),
            Type::nominal("num"),
            Type::array_of(Type::string()),
            Type::record([("x", Type::string()), ("n", Type::bool())]),
            Type::union(vec![Type::null(), Type::array_of(Type::int())]),
            Type::Top,
        ];
        let mut rng = StdRng::seed_from_u64(11);

        for ty in &types {
            for _ in 0..100 {
                let value = generate_value(ty, &mut rng, 3).expect("value should generate");
                assert!(
                    Type::wrap(&value).is_subtype_of(ty),
                    "generated value {value} does not match {ty}"
                );
            }
        }
    }
}
