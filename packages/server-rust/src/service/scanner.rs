//! Default descriptor scanner: binds a handler's marked callbacks after
//! checking that each one declares parameters its event can supply.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;
use wsmount_core::{
    AnnotatedMetadataBuilder, Binding, DescriptorScanner, EventKind, MessageKind, MethodDecl,
    ParamKind, PathSpec,
};

/// Invalid callback declarations found while scanning.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    #[error("{method}: duplicate {event} handler, already bound to {existing}")]
    Duplicate {
        method: String,
        event: EventKind,
        existing: String,
    },
    #[error("{method}: parameter {param:?} is not allowed on {event} callbacks")]
    InvalidParam {
        method: String,
        event: EventKind,
        param: ParamKind,
    },
    #[error("{method}: parameter {param:?} is declared more than once")]
    RepeatedParam { method: String, param: ParamKind },
    #[error("{method}: message callbacks take exactly one payload parameter, found {found}")]
    PayloadCount { method: String, found: usize },
    #[error("{method}: error callbacks take exactly one error parameter, found {found}")]
    ErrorParamCount { method: String, found: usize },
    #[error("{method}: partial-message flag requires a text or binary payload")]
    LastWithoutFragment { method: String },
    #[error("{method}: path parameter '{name}' is not a variable of {path}")]
    UnknownPathParam {
        method: String,
        name: String,
        path: String,
    },
}

/// Scans the callback declarations carried by a `HandlerClass`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MethodScanner;

impl MethodScanner {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn validate(method: &MethodDecl, event: EventKind, path: &PathSpec) -> Result<(), ScanError> {
        let mut seen = HashSet::new();
        for param in &method.params {
            if !seen.insert(param) {
                return Err(ScanError::RepeatedParam {
                    method: method.name.clone(),
                    param: param.clone(),
                });
            }
            if let ParamKind::PathParam(name) = param {
                if !path.has_variable(name) {
                    return Err(ScanError::UnknownPathParam {
                        method: method.name.clone(),
                        name: name.clone(),
                        path: path.to_string(),
                    });
                }
                continue;
            }
            if !allowed(event, param) {
                return Err(ScanError::InvalidParam {
                    method: method.name.clone(),
                    event,
                    param: param.clone(),
                });
            }
        }

        match event {
            EventKind::Message => {
                let payloads = method.params.iter().filter(|p| p.is_payload()).count();
                if payloads != 1 {
                    return Err(ScanError::PayloadCount {
                        method: method.name.clone(),
                        found: payloads,
                    });
                }
                if method.params.contains(&ParamKind::Last)
                    && method.params.contains(&ParamKind::Pong)
                {
                    return Err(ScanError::LastWithoutFragment {
                        method: method.name.clone(),
                    });
                }
            }
            EventKind::Error => {
                let errors = method
                    .params
                    .iter()
                    .filter(|p| **p == ParamKind::Throwable)
                    .count();
                if errors != 1 {
                    return Err(ScanError::ErrorParamCount {
                        method: method.name.clone(),
                        found: errors,
                    });
                }
            }
            EventKind::Open | EventKind::Close => {}
        }
        Ok(())
    }
}

fn allowed(event: EventKind, param: &ParamKind) -> bool {
    match event {
        EventKind::Open => matches!(param, ParamKind::Session | ParamKind::Config),
        EventKind::Message => matches!(
            param,
            ParamKind::Session
                | ParamKind::Text
                | ParamKind::Binary
                | ParamKind::Pong
                | ParamKind::Last
        ),
        EventKind::Error => matches!(param, ParamKind::Session | ParamKind::Throwable),
        EventKind::Close => matches!(param, ParamKind::Session | ParamKind::CloseReason),
    }
}

impl DescriptorScanner for MethodScanner {
    fn scan(&self, builder: &mut AnnotatedMetadataBuilder) -> anyhow::Result<()> {
        let class = Arc::clone(builder.class());
        for method in class.methods() {
            let Some(event) = method.event else {
                continue;
            };
            Self::validate(method, event, builder.path())?;

            let message_kind = match event {
                EventKind::Message => MessageKind::from_params(&method.params),
                _ => None,
            };
            builder
                .bind(Binding {
                    event,
                    message_kind,
                    method: method.name.clone(),
                    params: method.params.clone(),
                })
                .map_err(|existing| ScanError::Duplicate {
                    method: method.name.clone(),
                    event,
                    existing: existing.method,
                })?;
        }

        debug!(
            class = %class.id(),
            bindings = builder.bindings().len(),
            "scanned endpoint callbacks"
        );
        Ok(())
    }
}
