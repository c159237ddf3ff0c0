//! Property context resolution.
//!
//! Derives the property that scopes an operation from the signals the
//! routing layer hands over. Sources are tried in a fixed order and the
//! first well-formed one wins; signals are never combined, and the
//! absence of every signal yields `None` rather than a wider scope.

use leasehold_core::error::LeaseholdResult;
use leasehold_core::models::ids::PropertyId;
use leasehold_core::models::property::{Property, normalize_label};
use leasehold_core::repository::PropertyRepository;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ContextConfig;
use crate::token::ValidatedClaims;

/// Raw operation inputs, as extracted by the routing layer.
#[derive(Debug, Clone, Default)]
pub struct OperationInputs {
    /// Value of the trusted property header.
    pub header: Option<String>,
    /// Value of the property query parameter.
    pub query: Option<String>,
    /// Parsed JSON request body.
    pub body: Option<Value>,
    /// Verified session claims.
    pub claims: Option<ValidatedClaims>,
    /// `Origin` header, or `Host` when no origin was sent.
    pub origin: Option<String>,
}

/// Where a resolved property id came from, highest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextSource {
    Header,
    Query,
    Body,
    Claim,
    Origin,
}

impl ContextSource {
    /// Explicit sources are supplied per request by the caller, as opposed
    /// to being derived from the session or the origin.
    pub fn is_explicit(self) -> bool {
        matches!(self, Self::Header | Self::Query | Self::Body)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedProperty {
    pub property_id: PropertyId,
    pub source: ContextSource,
}

pub struct PropertyContextResolver<P> {
    properties: P,
    config: ContextConfig,
}

impl<P: PropertyRepository> PropertyContextResolver<P> {
    pub fn new(properties: P, config: ContextConfig) -> Self {
        Self { properties, config }
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Resolve the property scoping the operation, or `None` when no
    /// usable signal exists. Only the origin fallback touches the store.
    pub async fn resolve(
        &self,
        inputs: &OperationInputs,
    ) -> LeaseholdResult<Option<ResolvedProperty>> {
        if let Some(resolved) = resolve_signals(inputs, &self.config) {
            return Ok(Some(resolved));
        }

        let Some(label) = inputs
            .origin
            .as_deref()
            .and_then(|origin| origin_label(origin, &self.config.portal_base_domain))
        else {
            return Ok(None);
        };

        Ok(self
            .property_for_label(&label)
            .await?
            .map(|property| ResolvedProperty {
                property_id: property.id,
                source: ContextSource::Origin,
            }))
    }

    /// Exact portal-label match first, then a normalized-name match that
    /// only counts when it is unique.
    async fn property_for_label(&self, label: &str) -> LeaseholdResult<Option<Property>> {
        if let Some(property) = self.properties.find_by_portal_label(label).await? {
            return Ok(Some(property));
        }

        let mut matches = self.properties.find_by_normalized_name(label).await?;
        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.pop()),
            n => {
                warn!(
                    label = %label,
                    candidates = n,
                    "Origin label matches several properties by name; ignoring it"
                );
                Ok(None)
            }
        }
    }
}

/// The header, query, body and claim sources, in precedence order.
pub fn resolve_signals(
    inputs: &OperationInputs,
    config: &ContextConfig,
) -> Option<ResolvedProperty> {
    let explicit = [
        (ContextSource::Header, inputs.header.as_deref()),
        (ContextSource::Query, inputs.query.as_deref()),
    ];
    for (source, raw) in explicit {
        if let Some(property_id) = raw.and_then(|raw| well_formed(source, raw)) {
            return Some(ResolvedProperty { property_id, source });
        }
    }

    if let Some(property_id) = inputs
        .body
        .as_ref()
        .and_then(|body| body.get(&config.body_field))
        .and_then(body_signal)
    {
        return Some(ResolvedProperty {
            property_id,
            source: ContextSource::Body,
        });
    }

    inputs
        .claims
        .as_ref()
        .and_then(ValidatedClaims::property_id)
        .map(|property_id| ResolvedProperty {
            property_id,
            source: ContextSource::Claim,
        })
}

fn well_formed(source: ContextSource, raw: &str) -> Option<PropertyId> {
    let parsed = PropertyId::parse_signal(raw);
    if parsed.is_none() {
        debug!(?source, value = %raw, "Ignoring malformed property signal");
    }
    parsed
}

fn body_signal(value: &Value) -> Option<PropertyId> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(id) if id > 0 => Some(PropertyId(id)),
            _ => {
                debug!(value = %n, "Ignoring malformed property signal in body");
                None
            }
        },
        Value::String(s) => well_formed(ContextSource::Body, s),
        Value::Null => None,
        other => {
            debug!(value = %other, "Ignoring malformed property signal in body");
            None
        }
    }
}

/// The left-most label of `origin`'s host, when the host is a direct
/// sub-domain of `base_domain`.
///
/// Accepts a full origin (`https://pat.localhost:3000`) or a bare host.
pub fn origin_label(origin: &str, base_domain: &str) -> Option<String> {
    let rest = origin
        .trim()
        .split_once("://")
        .map_or(origin.trim(), |(_, rest)| rest);
    let authority = rest.split(['/', '?', '#']).next()?;
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    if host_port.starts_with('[') {
        // IPv6 literal, never a portal.
        return None;
    }
    let host = host_port
        .split(':')
        .next()?
        .trim_end_matches('.')
        .to_ascii_lowercase();

    let base = normalize_label(base_domain);
    let label = host.strip_suffix(&base)?.strip_suffix('.')?;
    if label.is_empty() || label.contains('.') {
        return None;
    }
    Some(label.to_string())
}
