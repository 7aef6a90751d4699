//! Security Wallet Server: the gated, notifying dispatcher over the
//! portfolio store.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::document::{CertificateValidator, Document, DocumentType};
use crate::wallet::config::{PortfolioConfig, Role};
use crate::wallet::error::{SwsError, SwsResult};
use crate::wallet::notify::{self, NotificationPublisher};
use crate::wallet::portfolio::{PortfolioStoreError, WalletDatabase};

/// Mutable state behind the server's single mutation lock. Handlers
/// never yield while holding it beyond the persist-then-notify
/// sequence.
struct State {
    db: WalletDatabase,
}

/// The Security Wallet Server. `Send + Sync` so it can live behind an
/// `Arc` and be shared across a transport's worker tasks.
pub struct SecurityWalletServer {
    state: Mutex<State>,
    configs: HashMap<String, PortfolioConfig>,
    certs: Arc<dyn CertificateValidator>,
    publisher: Arc<dyn NotificationPublisher>,
    db_path: PathBuf,
}

fn arg_str<'a>(args: &'a [Value], idx: usize, command: &str) -> SwsResult<&'a str> {
    args.get(idx)
        .and_then(Value::as_str)
        .ok_or_else(|| SwsError::BadCommandArgument {
            command: command.to_string(),
            reason: format!("missing or non-string argument at position {idx}"),
        })
}

impl SecurityWalletServer {
    pub fn new(
        db: WalletDatabase,
        configs: HashMap<String, PortfolioConfig>,
        certs: Arc<dyn CertificateValidator>,
        publisher: Arc<dyn NotificationPublisher>,
        db_path: PathBuf,
    ) -> Self {
        Self {
            state: Mutex::new(State { db }),
            configs,
            certs,
            publisher,
            db_path,
        }
    }

    fn config(&self, portfolio: &str) -> SwsResult<&PortfolioConfig> {
        self.configs
            .get(portfolio)
            .ok_or_else(|| SwsError::UnknownPortfolio(portfolio.to_string()))
    }

    /// Dispatches one request. `command ∈ {ERROR, OK}` is silently
    /// ignored, represented here by returning `Ok(Value::Null)` to the
    /// caller's no-op branch (the transport layer filters these before
    /// calling in; kept here defensively).
    #[instrument(skip(self, args), fields(command, sender))]
    pub fn handle(&self, sender: &str, command: &str, args: &[Value]) -> SwsResult<Value> {
        match command {
            "ERROR" | "OK" => Ok(Value::Null),
            "GET_PORTFOLIO_LIST" => self.get_portfolio_list(),
            "GET_CONSUMER_USAGES" => self.get_usages(sender, args, Role::Consumer),
            "GET_PRODUCER_USAGES" => self.get_usages(sender, args, Role::Producer),
            "GET_LIST_WITHOUT_SECRET" => self.get_list_without_secret(args),
            "GET_LIST_WITH_SECRET" => self.get_list_with_secret(sender, args),
            "GET_WITHOUT_SECRET" => self.get_without_secret(args, ById),
            "GET_WITHOUT_SECRET_BY_NAME" => self.get_without_secret(args, ByName),
            "GET_WITH_SECRET" => self.get_with_secret(sender, args, ById),
            "GET_WITH_SECRET_BY_NAME" => self.get_with_secret(sender, args, ByName),
            "CREATE" => self.create(sender, args),
            "UPDATE" => self.update(sender, args),
            "DELETE" => self.delete(sender, args),
            "GET_TAG_LIST" => self.get_tag_list(args),
            "GET_VERSION" => Ok(json!(env!("CARGO_PKG_VERSION"))),
            other => Err(SwsError::UnsupportedCommand(other.to_string())),
        }
    }

    fn get_portfolio_list(&self) -> SwsResult<Value> {
        let state = self.state.lock().expect("mutation lock poisoned");
        Ok(json!(state
            .db
            .portfolios
            .iter()
            .map(|p| p.name.clone())
            .collect::<Vec<_>>()))
    }

    fn get_usages(&self, sender: &str, args: &[Value], role: Role) -> SwsResult<Value> {
        let portfolio = arg_str(args, 0, "GET_*_USAGES")?;
        let config = self.config(portfolio)?;
        Ok(json!(config.allowed_usages(sender, role)))
    }

    fn get_list_without_secret(&self, args: &[Value]) -> SwsResult<Value> {
        let portfolio_name = arg_str(args, 0, "GET_LIST_WITHOUT_SECRET")?;
        let usage = args.get(1).and_then(Value::as_str);
        let config = self.config(portfolio_name)?;
        if let Some(usage) = usage {
            if !config.has_usage(usage) {
                return Err(SwsError::UnknownUsageId(usage.to_string()));
            }
        }

        let state = self.state.lock().expect("mutation lock poisoned");
        let portfolio = state
            .db
            .portfolio(portfolio_name)
            .ok_or_else(|| SwsError::UnknownPortfolio(portfolio_name.to_string()))?;

        let docs: Vec<Value> = portfolio
            .iter()
            .filter(|d| usage.map_or(true, |u| d.header.usages.contains(u)))
            .map(Document::to_public_json)
            .collect();
        Ok(json!(docs))
    }

    fn get_list_with_secret(&self, sender: &str, args: &[Value]) -> SwsResult<Value> {
        let portfolio_name = arg_str(args, 0, "GET_LIST_WITH_SECRET")?;
        let usage = args.get(1).and_then(Value::as_str);
        let config = self.config(portfolio_name)?;
        let allowed = config.allowed_usages(sender, Role::Consumer);
        if allowed.is_empty() {
            return Err(SwsError::IllegalAccess {
                sender: sender.to_string(),
                document_id: String::new(),
            });
        }
        if let Some(usage) = usage {
            if !allowed.contains(usage) {
                return Err(SwsError::IllegalAccess {
                    sender: sender.to_string(),
                    document_id: String::new(),
                });
            }
        }

        let state = self.state.lock().expect("mutation lock poisoned");
        let portfolio = state
            .db
            .portfolio(portfolio_name)
            .ok_or_else(|| SwsError::UnknownPortfolio(portfolio_name.to_string()))?;

        let docs: Vec<Value> = portfolio
            .iter()
            .filter(|d| match usage {
                Some(u) => d.header.usages.contains(u),
                None => d.header.usages.iter().any(|u| allowed.contains(u)),
            })
            .map(Document::to_full_json)
            .collect();
        Ok(json!(docs))
    }

    fn get_without_secret(&self, args: &[Value], lookup: LookupKind) -> SwsResult<Value> {
        let portfolio_name = arg_str(args, 0, "GET_WITHOUT_SECRET")?;
        let key = arg_str(args, 1, "GET_WITHOUT_SECRET")?;
        let state = self.state.lock().expect("mutation lock poisoned");
        let portfolio = state
            .db
            .portfolio(portfolio_name)
            .ok_or_else(|| SwsError::UnknownPortfolio(portfolio_name.to_string()))?;
        let doc = resolve(portfolio, key, lookup)?;
        Ok(doc.to_public_json())
    }

    fn get_with_secret(&self, sender: &str, args: &[Value], lookup: LookupKind) -> SwsResult<Value> {
        let portfolio_name = arg_str(args, 0, "GET_WITH_SECRET")?;
        let key = arg_str(args, 1, "GET_WITH_SECRET")?;
        let config = self.config(portfolio_name)?;
        let allowed = config.allowed_usages(sender, Role::Consumer);

        let state = self.state.lock().expect("mutation lock poisoned");
        let portfolio = state
            .db
            .portfolio(portfolio_name)
            .ok_or_else(|| SwsError::UnknownPortfolio(portfolio_name.to_string()))?;
        let doc = resolve(portfolio, key, lookup)?;

        if allowed.is_empty() || !doc.header.usages.iter().any(|u| allowed.contains(u)) {
            return Err(SwsError::IllegalAccess {
                sender: sender.to_string(),
                document_id: doc.header.id.clone(),
            });
        }
        Ok(doc.to_full_json())
    }

    fn get_tag_list(&self, args: &[Value]) -> SwsResult<Value> {
        let portfolio_name = arg_str(args, 0, "GET_TAG_LIST")?;
        let config = self.config(portfolio_name)?;
        Ok(json!(config.tags))
    }

    fn check_tags(&self, config: &PortfolioConfig, doc: &Document) -> SwsResult<()> {
        for tag in &doc.header.tags {
            if !config.has_tag(tag) {
                return Err(SwsError::UnknownTag(tag.clone()));
            }
        }
        Ok(())
    }

    #[instrument(skip(self, args), fields(sender))]
    fn create(&self, sender: &str, args: &[Value]) -> SwsResult<Value> {
        let portfolio_name = arg_str(args, 0, "CREATE")?;
        let doc_value = args
            .get(1)
            .ok_or_else(|| SwsError::BadCommandArgument {
                command: "CREATE".to_string(),
                reason: "missing document argument".to_string(),
            })?;

        let config = self.config(portfolio_name)?;
        let document = Document::from_json(doc_value)?;
        document.validate(self.certs.as_ref())?;
        self.check_tags(config, &document)?;

        let producer_usages = config.allowed_usages(sender, Role::Producer);
        if !document.header.usages.iter().all(|u| producer_usages.contains(u)) {
            return Err(SwsError::IllegalAccess {
                sender: sender.to_string(),
                document_id: String::new(),
            });
        }

        let id = Uuid::new_v4().to_string();
        let mut state = self.state.lock().expect("mutation lock poisoned");
        let portfolio = state
            .db
            .portfolio_mut(portfolio_name)
            .ok_or_else(|| SwsError::UnknownPortfolio(portfolio_name.to_string()))?;

        portfolio
            .insert(document, id.clone())
            .map_err(store_error_to_sws)?;
        let new_doc = portfolio.get_by_id(&id).expect("just inserted").clone();

        state
            .db
            .save(&self.db_path)
            .map_err(|e| SwsError::Generic(format!("persisting wallet database: {e}")))?;
        drop(state);

        notify::notify_created(self.publisher.as_ref(), portfolio_name, &new_doc);
        info!(document_id = %id, portfolio = portfolio_name, "document created");
        Ok(json!(id))
    }

    fn update(&self, sender: &str, args: &[Value]) -> SwsResult<Value> {
        let portfolio_name = arg_str(args, 0, "UPDATE")?;
        let doc_value = args
            .get(1)
            .ok_or_else(|| SwsError::BadCommandArgument {
                command: "UPDATE".to_string(),
                reason: "missing document argument".to_string(),
            })?;

        let config = self.config(portfolio_name)?;
        let mut incoming = Document::from_json(doc_value)?;
        self.check_tags(config, &incoming)?;

        let mut state = self.state.lock().expect("mutation lock poisoned");
        let portfolio = state
            .db
            .portfolio_mut(portfolio_name)
            .ok_or_else(|| SwsError::UnknownPortfolio(portfolio_name.to_string()))?;

        let id = incoming.header.id.clone();
        let existing = portfolio
            .get_by_id(&id)
            .ok_or_else(|| SwsError::DocumentDoesNotExist(id.clone()))?
            .clone();

        incoming.body = incoming.body.with_secret_from(&existing.body);
        incoming.validate(self.certs.as_ref())?;

        let delta: BTreeSet<_> = existing
            .header
            .usages
            .symmetric_difference(&incoming.header.usages)
            .cloned()
            .collect();
        let producer_usages = config.allowed_usages(sender, Role::Producer);
        if !delta.iter().all(|u| producer_usages.contains(u)) {
            return Err(SwsError::IllegalAccess {
                sender: sender.to_string(),
                document_id: id,
            });
        }

        let old_doc = portfolio.update(&id, incoming).map_err(store_error_to_sws)?;
        let new_doc = portfolio.get_by_id(&id).expect("just updated").clone();

        state
            .db
            .save(&self.db_path)
            .map_err(|e| SwsError::Generic(format!("persisting wallet database: {e}")))?;
        drop(state);

        notify::notify_updated(self.publisher.as_ref(), portfolio_name, &old_doc, &new_doc);
        Ok(json!("OK"))
    }

    fn delete(&self, sender: &str, args: &[Value]) -> SwsResult<Value> {
        let portfolio_name = arg_str(args, 0, "DELETE")?;
        let id = arg_str(args, 1, "DELETE")?;
        let config = self.config(portfolio_name)?;

        let mut state = self.state.lock().expect("mutation lock poisoned");
        let portfolio = state
            .db
            .portfolio_mut(portfolio_name)
            .ok_or_else(|| SwsError::UnknownPortfolio(portfolio_name.to_string()))?;

        let existing = portfolio
            .get_by_id(id)
            .ok_or_else(|| SwsError::DocumentDoesNotExist(id.to_string()))?;

        let producer_usages = config.allowed_usages(sender, Role::Producer);
        if !existing.header.usages.iter().all(|u| producer_usages.contains(u)) {
            return Err(SwsError::IllegalAccess {
                sender: sender.to_string(),
                document_id: id.to_string(),
            });
        }

        let removed = portfolio.remove(id).map_err(store_error_to_sws)?;

        state
            .db
            .save(&self.db_path)
            .map_err(|e| SwsError::Generic(format!("persisting wallet database: {e}")))?;
        drop(state);

        notify::notify_deleted(self.publisher.as_ref(), portfolio_name, &removed);
        Ok(json!("OK"))
    }
}

#[derive(Debug, Clone, Copy)]
enum LookupKind {
    ById,
    ByName,
}
use LookupKind::{ByName, ById};

fn resolve<'a>(
    portfolio: &'a crate::wallet::portfolio::Portfolio,
    key: &str,
    lookup: LookupKind,
) -> SwsResult<&'a Document> {
    match lookup {
        LookupKind::ById => portfolio
            .get_by_id(key)
            .ok_or_else(|| SwsError::DocumentDoesNotExist(key.to_string())),
        LookupKind::ByName => {
            let id = portfolio
                .resolve_name(key)
                .map_err(|_| SwsError::NameDoesNotExist(key.to_string()))?;
            portfolio
                .get_by_id(id)
                .ok_or_else(|| SwsError::DocumentDoesNotExist(key.to_string()))
        }
    }
}

fn store_error_to_sws(error: PortfolioStoreError) -> SwsError {
    match error {
        PortfolioStoreError::NameAlreadyExists(name) => SwsError::NameAlreadyExists(name),
        PortfolioStoreError::DocumentDoesNotExist(id) => SwsError::DocumentDoesNotExist(id),
        PortfolioStoreError::NameDoesNotExist(name) => SwsError::NameDoesNotExist(name),
    }
}

/// Recognized document type names, exposed for CLI/tooling help text.
pub fn supported_document_types() -> Vec<&'static str> {
    DocumentType::all().iter().map(|t| t.as_str()).collect()
}
