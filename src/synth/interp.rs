use crate::synth::ast::Term;
use crate::synth::catalog::SignatureCatalog;
use crate::synth::context::Environment;
use crate::synth::types::Type;
use std::collections::BTreeMap;
use thiserror::Error;

/// Raised for terms the interpreter cannot classify. Expanded candidates
/// only reference bound variables, so this indicates an engine bug.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum TypeInterpretationError {
    #[error("undefined variable `{0}`")]
    UndefinedVariable(String),
}

/// Abstract type of `term` under `env`. Holes evaluate to their goal type.
pub fn interpret(
    env: &Environment,
    catalog: &SignatureCatalog,
    term: &Term,
) -> Result<Type, TypeInterpretationError> {
    match term {
        Term::Literal(value) => Ok(Type::wrap(value)),
        Term::VariableRef(name) => env
            .get(name)
            .cloned()
            .ok_or_else(|| TypeInterpretationError::UndefinedVariable(name.clone())),
        Term::Hole(hole) => Ok(hole.goal.clone()),
        Term::MethodCall {
            receiver,
            name,
            args,
        } => {
            let receiver_ty = interpret(env, catalog, receiver)?;
            let arg_tys = interpret_all(env, catalog, args)?;
            if let Some(ty) = builtin_call_type(&receiver_ty, name, &arg_tys) {
                return Ok(ty);
            }
            Ok(catalog_call_type(catalog, &receiver_ty, name, &arg_tys))
        }
        Term::FieldAccess {
            receiver,
            name,
            args,
        } => {
            let receiver_ty = interpret(env, catalog, receiver)?;
            let arg_tys = interpret_all(env, catalog, args)?;
            if let Type::FiniteRecord(fields) = &receiver_ty
                && arg_tys.is_empty()
                && let Some(field_ty) = fields.get(name)
            {
                return Ok(field_ty.clone());
            }
            Ok(catalog_call_type(catalog, &receiver_ty, name, &arg_tys))
        }
        Term::ArrayLiteral(items) => {
            let item_tys = interpret_all(env, catalog, items)?;
            Ok(Type::array_of(Type::union(item_tys)))
        }
        Term::RecordLiteral(entries) => {
            let mut fields = BTreeMap::new();
            for (key, value) in entries {
                fields.insert(key.clone(), interpret(env, catalog, value)?);
            }
            Ok(Type::FiniteRecord(fields))
        }
        Term::SliceExpr {
            receiver,
            start,
            end,
            ..
        } => {
            let receiver_ty = interpret(env, catalog, receiver)?;
            for bound in [start, end].into_iter().flatten() {
                if !interpret(env, catalog, bound)?.is_int_like() {
                    return Ok(Type::Top);
                }
            }
            Ok(slice_type(&receiver_ty))
        }
    }
}

fn interpret_all(
    env: &Environment,
    catalog: &SignatureCatalog,
    terms: &[Term],
) -> Result<Vec<Type>, TypeInterpretationError> {
    terms
        .iter()
        .map(|term| interpret(env, catalog, term))
        .collect()
}

/// Type-level shortcuts for arithmetic, concatenation and string indexing.
/// Consulted before the catalog.
fn builtin_call_type(receiver: &Type, name: &str, args: &[Type]) -> Option<Type> {
    let [arg] = args else {
        return None;
    };
    match name {
        "add" | "mul" if receiver.is_int_like() && arg.is_int_like() => Some(Type::int()),
        "add" if receiver.is_string_like() && arg.is_string_like() => Some(Type::string()),
        "index" if receiver.is_string_like() && arg.is_int_like() => Some(Type::string()),
        _ => None,
    }
}

fn slice_type(receiver: &Type) -> Type {
    if receiver.is_string_like() {
        return Type::string();
    }
    let promoted = receiver.promote();
    if promoted.element_type().is_some() {
        promoted
    } else {
        Type::Top
    }
}

/// First overload whose parameters accept the actual arguments, directly or
/// after promotion. Missing receivers, methods and overloads all yield `Top`.
fn catalog_call_type(
    catalog: &SignatureCatalog,
    receiver: &Type,
    name: &str,
    args: &[Type],
) -> Type {
    let Some(key) = receiver.nominal_key() else {
        return Type::Top;
    };
    let Some(overloads) = catalog.lookup(&key, name) else {
        return Type::Top;
    };

    let binding = receiver
        .promote()
        .element_type()
        .cloned()
        .unwrap_or(Type::Top);

    for signature in overloads {
        if signature.args.len() != args.len() {
            continue;
        }
        let accepts = signature.args.iter().zip(args).all(|(param, actual)| {
            let param = param.substitute_vars(&binding);
            actual.is_subtype_of(&param) || actual.promote().is_subtype_of(&param)
        });
        if accepts {
            return if signature.ret.contains_vars() {
                signature.ret.substitute_vars(&binding)
            } else {
                signature.ret.clone()
            };
        }
    }

    Type::Top
}

#[cfg(test)]
mod tests {
    use super::{TypeInterpretationError, interpret};
    use crate::synth::ast::Term;
    use crate::synth::catalog::SignatureCatalog;
    use crate::synth::context::Environment;
    use crate::synth::types::Type;
    use serde_json::json;

    fn env(bindings: &[(&str, Type)]) -> Environment {
        bindings
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn literals_wrap_precisely() {
        let catalog = SignatureCatalog::new();
        let env = Environment::new();
        assert_eq!(
            interpret(&env, &catalog, &Term::literal(5)),
            Ok(Type::wrap(&json!(5)))
        );
        assert_eq!(
            interpret(&env, &catalog, &Term::literal(true)),
            Ok(Type::nominal("true"))
        );
    }

    #[test]
    fn undefined_variable_is_fatal() {
        let err = interpret(&Environment::new(), &SignatureCatalog::new(), &Term::var("x"))
            .unwrap_err();
        assert_eq!(err, TypeInterpretationError::UndefinedVariable("x".into()));
    }

    #[test]
    fn holes_report_their_goal() {
        let goal = Type::array_of(Type::string());
        let ty = interpret(
            &Environment::new(),
            &SignatureCatalog::new(),
            &Term::hole(goal.clone()),
        );
        assert_eq!(ty, Ok(goal));
    }

    #[test]
    fn arithmetic_fast_path_yields_general_int() {
        let env = env(&[("a", Type::wrap(&json!(2)))]);
        let term = Term::call(Term::var("a"), "mul", vec![Term::literal(3)]);
        assert_eq!(
            interpret(&env, &SignatureCatalog::new(), &term),
            Ok(Type::int())
        );
    }

    #[test]
    fn concatenation_and_slices_yield_general_string() {
        let env = env(&[("s", Type::wrap(&json!("hello")))]);
        let catalog = SignatureCatalog::new();
        let concat = Term::call(Term::var("s"), "add", vec![Term::literal("!")]);
        let slice = Term::slice(Term::var("s"), Some(Term::literal(0)), Some(Term::literal(2)));
        let reversed = Term::reverse(Term::var("s"));
        for term in [concat, slice, reversed] {
            assert_eq!(interpret(&env, &catalog, &term), Ok(Type::string()), "{term}");
        }
    }

    #[test]
    fn slice_with_non_integer_bound_is_top() {
        let env = env(&[("s", Type::string())]);
        let term = Term::slice(Term::var("s"), Some(Term::literal("x")), None);
        assert_eq!(
            interpret(&env, &SignatureCatalog::new(), &term),
            Ok(Type::Top)
        );
    }

    #[test]
    fn catalog_lookup_substitutes_generic_parameter() {
        let env = env(&[("xs", Type::array_of(Type::string()))]);
        let catalog = SignatureCatalog::standard();
        let term = Term::call(Term::var("xs"), "index", vec![Term::literal(0)]);
        assert_eq!(interpret(&env, &catalog, &term), Ok(Type::string()));

        let split = Term::call(
            Term::call(Term::var("xs"), "join", vec![Term::literal(",")]),
            "split",
            vec![Term::literal(",")],
        );
        assert_eq!(
            interpret(&env, &catalog, &split),
            Ok(Type::array_of(Type::string()))
        );
    }

    #[test]
    fn missing_catalog_entry_is_permissive() {
        let env = env(&[("s", Type::string())]);
        let term = Term::call(Term::var("s"), "frobnicate", vec![]);
        assert_eq!(
            interpret(&env, &SignatureCatalog::standard(), &term),
            Ok(Type::Top)
        );
    }

    #[test]
    fn overload_selection_promotes_arguments() {
        let env = env(&[("n", Type::wrap(&json!(4)))]);
        let catalog = SignatureCatalog::new().with("int", "to_str", vec![], Type::string());
        let term = Term::call(Term::var("n"), "to_str", vec![]);
        assert_eq!(interpret(&env, &catalog, &term), Ok(Type::string()));
    }

    #[test]
    fn record_literals_and_field_access() {
        let env = env(&[("n", Type::int())]);
        let catalog = SignatureCatalog::new();
        let record = Term::record(vec![
            ("a".to_string(), Term::var("n")),
            ("b".to_string(), Term::literal("x")),
        ]);
        let ty = interpret(&env, &catalog, &record).expect("record interprets");
        assert!(ty.is_subtype_of(&Type::record([("a", Type::int()), ("b", Type::string())])));
        assert_eq!(
            interpret(&env, &catalog, &Term::field(record, "a")),
            Ok(Type::int())
        );
    }

    #[test]
    fn array_literals_union_their_items() {
        let term = Term::array(vec![Term::literal(1), Term::literal("a")]);
        let ty = interpret(&Environment::new(), &SignatureCatalog::new(), &term)
            .expect("array interprets");
        assert!(ty.is_subtype_of(&Type::array_of(Type::union(vec![
            Type::int(),
            Type::string()
        ]))));
        assert!(!ty.is_subtype_of(&Type::array_of(Type::int())));
    }
}
