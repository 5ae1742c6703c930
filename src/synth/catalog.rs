use crate::synth::types::{ARRAY, INT, RECORD, STR, Type};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub args: Vec<Type>,
    pub ret: Type,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to parse signature catalog: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read signature catalog: {0}")]
    Io(#[from] std::io::Error),
}

/// Read-only `(receiver type, method) -> overloads` table consulted by the
/// interpreter and by catalog-driven hole expansion.
///
/// Serialized as `{"str": {"upper": [{"args": [], "ret": {"Nominal": "str"}}]}}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignatureCatalog {
    entries: BTreeMap<String, BTreeMap<String, Vec<Signature>>>,
}

impl SignatureCatalog {
    pub fn new() -> SignatureCatalog {
        SignatureCatalog::default()
    }

    /// Methods on strings, arrays and integers that the reference evaluator
    /// knows how to run.
    pub fn standard() -> SignatureCatalog {
        let str_ty = Type::string();
        let int_ty = Type::int();
        let elem = Type::var("T");

        let mut catalog = SignatureCatalog::new()
            .with(STR, "add", vec![str_ty.clone()], str_ty.clone())
            .with(STR, "length", vec![], int_ty.clone())
            .with(STR, "split", vec![str_ty.clone()], Type::array_of(str_ty.clone()))
            .with(STR, "index", vec![int_ty.clone()], str_ty.clone())
            .with(STR, "strip", vec![], str_ty.clone())
            .with(STR, "to_int", vec![], int_ty.clone())
            .with(ARRAY, "length", vec![], int_ty.clone())
            .with(ARRAY, "index", vec![int_ty.clone()], elem.clone())
            .with(ARRAY, "first", vec![], elem.clone())
            .with(ARRAY, "last", vec![], elem)
            .with(ARRAY, "join", vec![str_ty.clone()], str_ty.clone())
            .with(INT, "add", vec![int_ty.clone()], int_ty.clone())
            .with(INT, "mul", vec![int_ty.clone()], int_ty.clone())
            .with(INT, "to_str", vec![], str_ty.clone())
            .with(RECORD, "length", vec![], int_ty);
        for method in ["upper", "lower", "capitalize", "title"] {
            catalog.insert(STR, method, Signature {
                args: vec![],
                ret: str_ty.clone(),
            });
        }
        catalog
    }

    pub fn from_json_str(text: &str) -> Result<SignatureCatalog, CatalogError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<std::path::Path>) -> Result<SignatureCatalog, CatalogError> {
        let body = std::fs::read_to_string(path)?;
        SignatureCatalog::from_json_str(&body)
    }

    pub fn to_json_string(&self) -> Result<String, CatalogError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with(
        mut self,
        receiver: &str,
        method: &str,
        args: Vec<Type>,
        ret: Type,
    ) -> SignatureCatalog {
        self.insert(receiver, method, Signature { args, ret });
        self
    }

    pub fn insert(&mut self, receiver: &str, method: &str, signature: Signature) {
        self.entries
            .entry(receiver.to_string())
            .or_default()
            .entry(method.to_string())
            .or_default()
            .push(signature);
    }

    pub fn lookup(&self, receiver: &str, method: &str) -> Option<&[Signature]> {
        self.entries
            .get(receiver)?
            .get(method)
            .map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every overload as `(receiver, method, signature)`, in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, &Signature)> + '_ {
        self.entries.iter().flat_map(|(receiver, methods)| {
            methods.iter().flat_map(move |(method, overloads)| {
                overloads
                    .iter()
                    .map(move |sig| (receiver.as_str(), method.as_str(), sig))
            })
        })
    }

    /// Goal type for a hole standing in for a receiver of `receiver`.
    pub fn receiver_type(receiver: &str) -> Type {
        match receiver {
            ARRAY => Type::array_of(Type::Top),
            other => Type::nominal(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SignatureCatalog;
    use crate::synth::types::Type;

    #[test]
    fn standard_catalog_resolves_overloads() {
        let catalog = SignatureCatalog::standard();
        let upper = catalog.lookup("str", "upper").expect("upper is registered");
        assert_eq!(upper.len(), 1);
        assert_eq!(upper[0].ret, Type::string());
        assert!(catalog.lookup("str", "frobnicate").is_none());
        assert!(catalog.lookup("widget", "upper").is_none());
    }

    #[test]
    fn catalog_loads_from_json() {
        let text = r#"{
            "str": {
                "shout": [{"args": [], "ret": {"Nominal": "str"}}]
            },
            "array": {
                "index": [{"args": [{"Nominal": "int"}], "ret": {"Var": "T"}}]
            }
        }"#;
        let catalog = SignatureCatalog::from_json_str(text).expect("catalog should parse");
        assert_eq!(
            catalog.lookup("array", "index").map(|s| s[0].ret.clone()),
            Some(Type::var("T"))
        );
        assert_eq!(catalog.entries().count(), 2);

        let round_tripped =
            SignatureCatalog::from_json_str(&catalog.to_json_string().expect("serializes"))
                .expect("reparses");
        assert_eq!(round_tripped, catalog);
    }

    #[test]
    fn malformed_catalog_reports_error() {
        assert!(SignatureCatalog::from_json_str("{\"str\": 3}").is_err());
    }
}
