use serde::{Deserialize, Serialize};

use super::{
    FluidToken, RootUnitSize, StaticToken, TokenEntry, TokenError, TokenKind, TokenResult,
    TokenStore,
};
use crate::snapshot::ImportReport;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AddFluidToken {
    pub name: String,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EditFluidToken {
    pub original_name: String,
    pub name: String,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AddStaticToken {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EditStaticToken {
    pub original_name: String,
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeleteToken {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpdateRootUnitSize {
    #[serde(alias = "root_unit_size", alias = "rootFontSize")]
    pub root_font_size: String,
}

/// One mutation, decoded and shape-checked once at the boundary.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TokenRequest {
    AddToken(AddFluidToken),
    EditToken(EditFluidToken),
    DeleteToken(DeleteToken),
    AddStaticToken(AddStaticToken),
    EditStaticToken(EditStaticToken),
    DeleteStaticToken(DeleteToken),
    UpdateSettings(UpdateRootUnitSize),
    ImportTokens { tokens: serde_json::Value },
}

impl TokenRequest {
    /// Decode a request; missing or mistyped fields are malformed input.
    pub fn from_json(payload: &str) -> TokenResult<Self> {
        serde_json::from_str(payload).map_err(|err| TokenError::MalformedInput {
            message: err.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RequestOutcome {
    FluidToken(TokenEntry<FluidToken>),
    StaticToken(TokenEntry<StaticToken>),
    Deleted { kind: TokenKind, name: String },
    RootUnitSize { root_font_size: RootUnitSize },
    Imported(ImportReport),
}

impl TokenStore {
    pub fn apply(&mut self, request: TokenRequest) -> TokenResult<RequestOutcome> {
        match request {
            TokenRequest::AddToken(req) => self
                .add_fluid_token(&req.name, req.min, req.max)
                .map(RequestOutcome::FluidToken),
            TokenRequest::EditToken(req) => self
                .edit_fluid_token(&req.original_name, &req.name, req.min, req.max)
                .map(RequestOutcome::FluidToken),
            TokenRequest::DeleteToken(req) => {
                let entry = self.delete_fluid_token(&req.name)?;
                Ok(RequestOutcome::Deleted {
                    kind: TokenKind::Fluid,
                    name: entry.name,
                })
            }
            TokenRequest::AddStaticToken(req) => self
                .add_static_token(&req.name, req.value)
                .map(RequestOutcome::StaticToken),
            TokenRequest::EditStaticToken(req) => self
                .edit_static_token(&req.original_name, &req.name, req.value)
                .map(RequestOutcome::StaticToken),
            TokenRequest::DeleteStaticToken(req) => {
                let entry = self.delete_static_token(&req.name)?;
                Ok(RequestOutcome::Deleted {
                    kind: TokenKind::Static,
                    name: entry.name,
                })
            }
            TokenRequest::UpdateSettings(req) => self
                .update_root_unit_size(&req.root_font_size)
                .map(|root_font_size| RequestOutcome::RootUnitSize { root_font_size }),
            TokenRequest::ImportTokens { tokens } => {
                self.import_snapshot(&tokens).map(RequestOutcome::Imported)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn decodes_tagged_requests() {
        let request =
            TokenRequest::from_json(r#"{"action":"add_token","name":"H1","min":1.5,"max":3}"#)
                .unwrap();
        assert_eq!(
            request,
            TokenRequest::AddToken(AddFluidToken {
                name: "H1".to_string(),
                min: 1.5,
                max: 3.0,
            })
        );

        let request = TokenRequest::from_json(
            r#"{"action":"update_settings","root_font_size":"100%"}"#,
        )
        .unwrap();
        assert!(matches!(request, TokenRequest::UpdateSettings(_)));
    }

    #[test]
    fn missing_fields_are_malformed_input() {
        let err = TokenRequest::from_json(r#"{"action":"add_token","name":"h1","min":1}"#)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);

        let err = TokenRequest::from_json(r#"{"action":"rename_everything"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn apply_routes_to_store_operations() {
        let mut store = TokenStore::new();
        let outcome = store
            .apply(TokenRequest::AddStaticToken(AddStaticToken {
                name: "gap".to_string(),
                value: 1.0,
            }))
            .unwrap();
        assert!(matches!(outcome, RequestOutcome::StaticToken(ref entry) if entry.name == "gap"));

        let outcome = store
            .apply(TokenRequest::DeleteStaticToken(DeleteToken {
                name: "GAP ".to_string(),
            }))
            .unwrap();
        assert_eq!(
            outcome,
            RequestOutcome::Deleted {
                kind: TokenKind::Static,
                name: "gap".to_string()
            }
        );

        let err = store
            .apply(TokenRequest::EditToken(EditFluidToken {
                original_name: "missing".to_string(),
                name: "missing".to_string(),
                min: 1.0,
                max: 2.0,
            }))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn outcome_serializes_with_result_tag() {
        let outcome = RequestOutcome::RootUnitSize {
            root_font_size: RootUnitSize::LargeBase,
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["result"], "root_unit_size");
        assert_eq!(value["root_font_size"], "100%");
    }
}
