//! Moniker assignment.
//!
//! Three kinds of identifier come out of here:
//!
//! - **Export**: `<module>:` for a module root, `<module>:<dotted.path>` for
//!   anything reachable from a module's public surface. Unique per group.
//! - **Import**: same format, for symbols declared in dependency files.
//! - **Local**: lowercase hex SHA-256 of a [`LocalKey`]. Unique per document.
//!
//! The assigner owns the registry of claimed export identifiers. A claim that
//! collides with an existing one is either a demotion (a distinct member of
//! the same merged container; first declaration wins) or a fatal
//! [`IndexError::MonikerConflict`].

use std::collections::HashMap;
use std::fmt;

use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::{IndexError, Result};
use crate::graph::{MonikerData, MonikerKind, UniquenessLevel};
use crate::model::{DocumentId, SymbolKey, SymbolKind};
use crate::nodes::NodeId;

// ============================================================================
// Local Keys
// ============================================================================

/// Canonical key of a symbol that has no export path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalKey {
    /// Path of the declaring document.
    pub document: String,
    /// Dotted name through same-document containers.
    pub qualified_name: String,
    pub kind: SymbolKind,
}

impl LocalKey {
    pub fn new(
        document: impl Into<String>,
        qualified_name: impl Into<String>,
        kind: SymbolKind,
    ) -> Self {
        LocalKey {
            document: document.into(),
            qualified_name: qualified_name.into(),
            kind,
        }
    }

    /// SHA-256 over the length-prefixed fields, hex-encoded.
    ///
    /// Length prefixes keep `("a.b", "c")` and `("a", "b.c")` apart.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for field in [
            self.document.as_str(),
            self.qualified_name.as_str(),
            self.kind.as_str(),
        ] {
            hasher.update((field.len() as u64).to_be_bytes());
            hasher.update(field.as_bytes());
        }
        hex::encode(hasher.finalize())
    }

    fn with_ordinal(&self, ordinal: usize) -> LocalKey {
        LocalKey {
            qualified_name: format!("{}#{}", self.qualified_name, ordinal),
            ..self.clone()
        }
    }
}

impl fmt::Display for LocalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({})", self.document, self.qualified_name, self.kind)
    }
}

/// Function that turns a local key into an identifier.
pub type LocalHasher = fn(&LocalKey) -> String;

/// Compose an export identifier from a module path and name segments.
///
/// ```
/// use tugindex::moniker::export_identifier;
///
/// assert_eq!(export_identifier::<&str>("a", &[]), "a:");
/// assert_eq!(export_identifier("a", &["RAL", "console", "warn"]), "a:RAL.console.warn");
/// ```
pub fn export_identifier<S: AsRef<str>>(module: &str, path: &[S]) -> String {
    let segments: Vec<&str> = path.iter().map(AsRef::as_ref).collect();
    format!("{}:{}", module, segments.join("."))
}

// ============================================================================
// Export Claims
// ============================================================================

/// Who claims an export identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClaimOwner {
    Module(DocumentId),
    Symbol(SymbolKey),
}

/// A request to own an export identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportClaim {
    pub owner: ClaimOwner,
    /// Container with several declarations whose members compete for paths.
    pub merged_parent: Option<SymbolKey>,
    /// Human-readable owner for diagnostics.
    pub description: String,
    /// Path of the document the claim comes from.
    pub document: String,
}

#[derive(Debug)]
struct ClaimRecord {
    claim: ExportClaim,
    node: NodeId,
}

/// State of an export identifier with respect to a new claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportSlot {
    /// Nobody owns it yet.
    Free,
    /// The same owner already holds it on this node.
    Owned(NodeId),
    /// A sibling from the same merged container got there first.
    Demoted,
}

/// What the assigner needs to know about a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonikerContext {
    /// Root of a module document.
    ModuleRoot {
        document: DocumentId,
        module: String,
        path: String,
        kind: MonikerKind,
    },
    /// A node reachable under `identifier`.
    Exported {
        identifier: String,
        kind: MonikerKind,
        claim: ExportClaim,
    },
    /// A node with no export path that still needs an identity.
    Local { symbol: SymbolKey, key: LocalKey },
    /// No moniker.
    Hidden,
}

// ============================================================================
// Assigner
// ============================================================================

/// Assigns monikers and tracks every identifier handed out in a pass.
pub struct MonikerAssigner {
    scheme: String,
    claims: HashMap<String, ClaimRecord>,
    /// digest → key that produced it.
    locals: HashMap<String, LocalKey>,
    /// base key → symbols sharing it, in assignment order.
    key_owners: HashMap<LocalKey, Vec<SymbolKey>>,
    hasher: LocalHasher,
    demoted: usize,
}

impl fmt::Debug for MonikerAssigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonikerAssigner")
            .field("scheme", &self.scheme)
            .field("claims", &self.claims.len())
            .field("locals", &self.locals.len())
            .field("demoted", &self.demoted)
            .finish()
    }
}

impl MonikerAssigner {
    /// Create an assigner writing `scheme` on every moniker.
    pub fn new(scheme: impl Into<String>) -> Self {
        MonikerAssigner {
            scheme: scheme.into(),
            claims: HashMap::new(),
            locals: HashMap::new(),
            key_owners: HashMap::new(),
            hasher: LocalKey::digest,
            demoted: 0,
        }
    }

    /// Replace the local key hasher.
    pub fn with_hasher(mut self, hasher: LocalHasher) -> Self {
        self.hasher = hasher;
        self
    }

    /// Number of member claims demoted so far.
    pub fn demoted(&self) -> usize {
        self.demoted
    }

    /// Check how `identifier` stands against `claim`.
    ///
    /// Fails with [`IndexError::MonikerConflict`] when a different owner holds
    /// the identifier and the two are not siblings in one merged container.
    pub fn export_slot(&self, identifier: &str, claim: &ExportClaim) -> Result<ExportSlot> {
        let Some(record) = self.claims.get(identifier) else {
            return Ok(ExportSlot::Free);
        };
        if record.claim.owner == claim.owner {
            return Ok(ExportSlot::Owned(record.node));
        }
        if claim.merged_parent.is_some() && record.claim.merged_parent == claim.merged_parent {
            return Ok(ExportSlot::Demoted);
        }
        Err(IndexError::MonikerConflict {
            identifier: identifier.to_string(),
            existing: record.claim.description.clone(),
            incoming: claim.description.clone(),
            document: claim.document.clone(),
        })
    }

    /// Record that `claim` lost `identifier` to an earlier sibling.
    pub fn demote(&mut self, identifier: &str, claim: &ExportClaim) {
        self.demoted += 1;
        let winner = self
            .claims
            .get(identifier)
            .map(|record| record.claim.description.as_str())
            .unwrap_or("unknown");
        warn!(
            identifier,
            winner,
            demoted = %claim.description,
            document = %claim.document,
            "member export collides with an earlier declaration; keeping the first"
        );
    }

    /// Compute the moniker for `node`, claiming its identifier.
    pub fn assign(&mut self, node: NodeId, context: MonikerContext) -> Result<Option<MonikerData>> {
        match context {
            MonikerContext::ModuleRoot {
                document,
                module,
                path,
                kind,
            } => {
                let identifier = export_identifier::<&str>(&module, &[]);
                let claim = ExportClaim {
                    owner: ClaimOwner::Module(document),
                    merged_parent: None,
                    description: format!("module {}", module),
                    document: path,
                };
                self.claim(node, identifier, kind, claim).map(Some)
            }
            MonikerContext::Exported {
                identifier,
                kind,
                claim,
            } => self.claim(node, identifier, kind, claim).map(Some),
            MonikerContext::Local { symbol, key } => {
                let identifier = self.local_identifier(symbol, key)?;
                Ok(Some(self.moniker(identifier, UniquenessLevel::Document, MonikerKind::Local)))
            }
            MonikerContext::Hidden => Ok(None),
        }
    }

    fn claim(
        &mut self,
        node: NodeId,
        identifier: String,
        kind: MonikerKind,
        claim: ExportClaim,
    ) -> Result<MonikerData> {
        match self.export_slot(&identifier, &claim)? {
            ExportSlot::Free => {}
            ExportSlot::Owned(existing) => {
                return Err(IndexError::invariant(format!(
                    "'{}' already assigned to {} for {}",
                    identifier, existing, claim.description
                )))
            }
            ExportSlot::Demoted => {
                return Err(IndexError::invariant(format!(
                    "'{}' assigned to demoted {}",
                    identifier, claim.description
                )))
            }
        }
        self.claims
            .insert(identifier.clone(), ClaimRecord { claim, node });
        Ok(self.moniker(identifier, UniquenessLevel::Group, kind))
    }

    fn local_identifier(&mut self, symbol: SymbolKey, base: LocalKey) -> Result<String> {
        let owners = self.key_owners.entry(base.clone()).or_default();
        let ordinal = match owners.iter().position(|owner| *owner == symbol) {
            Some(ordinal) => ordinal,
            None => {
                owners.push(symbol);
                owners.len() - 1
            }
        };
        let key = if ordinal == 0 {
            base
        } else {
            base.with_ordinal(ordinal)
        };

        let identifier = (self.hasher)(&key);
        match self.locals.get(&identifier) {
            Some(existing) if *existing != key => Err(IndexError::LocalMonikerCollision {
                identifier,
                first: existing.to_string(),
                second: key.to_string(),
            }),
            Some(_) => Ok(identifier),
            None => {
                self.locals.insert(identifier.clone(), key);
                Ok(identifier)
            }
        }
    }

    fn moniker(
        &self,
        identifier: String,
        unique: UniquenessLevel,
        kind: MonikerKind,
    ) -> MonikerData {
        MonikerData {
            scheme: self.scheme.clone(),
            identifier,
            unique,
            kind,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
