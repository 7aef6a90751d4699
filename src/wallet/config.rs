//! Portfolio configuration: usage catalog plus consumer/producer client
//! rules, loaded from `configuration.json` and compiled once per
//! portfolio load so access checks never re-parse a regex.

use std::collections::BTreeSet;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::document::{DocumentType, Tag, UsageId};

/// A usage gates access to documents carrying it; `supported_types`
/// restricts which document types may be tagged with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub usage_id: UsageId,
    pub supported_types: BTreeSet<DocumentType>,
}

/// A `{tag, description}` pair from the static tag catalog backing
/// `GET_TAG_LIST` / `UnknownTag`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDescription {
    pub tag: Tag,
    pub description: String,
}

/// A client rule: `client_regex` matched full-string against the sender,
/// granting `usages` on a match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientRule {
    pub client_regex: String,
    pub usages: BTreeSet<UsageId>,
}

/// The same rule with its regex pre-compiled and anchored at both ends.
#[derive(Debug, Clone)]
pub struct CompiledClientRule {
    pub regex: Regex,
    pub usages: BTreeSet<UsageId>,
}

impl CompiledClientRule {
    fn compile(rule: &ClientRule) -> Result<Self, regex::Error> {
        let anchored = format!("^(?:{})$", rule.client_regex);
        Ok(Self {
            regex: Regex::new(&anchored)?,
            usages: rule.usages.clone(),
        })
    }

    pub fn matches(&self, sender: &str) -> bool {
        self.regex.is_match(sender)
    }
}

/// Raw, on-disk shape of one portfolio's configuration entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioConfigData {
    pub portfolio_name: String,
    pub usages: Vec<Usage>,
    #[serde(default)]
    pub tags: Vec<TagDescription>,
    pub consumers: Vec<ClientRule>,
    pub producers: Vec<ClientRule>,
}

/// Loaded, regex-compiled configuration for a single portfolio.
#[derive(Debug, Clone)]
pub struct PortfolioConfig {
    pub portfolio_name: String,
    pub usages: Vec<Usage>,
    pub tags: Vec<TagDescription>,
    pub consumers: Vec<CompiledClientRule>,
    pub producers: Vec<CompiledClientRule>,
}

/// Role used when evaluating access for a sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Consumer,
    Producer,
}

impl PortfolioConfig {
    pub fn compile(data: &PortfolioConfigData) -> Result<Self, regex::Error> {
        Ok(Self {
            portfolio_name: data.portfolio_name.clone(),
            usages: data.usages.clone(),
            tags: data.tags.clone(),
            consumers: data
                .consumers
                .iter()
                .map(CompiledClientRule::compile)
                .collect::<Result<_, _>>()?,
            producers: data
                .producers
                .iter()
                .map(CompiledClientRule::compile)
                .collect::<Result<_, _>>()?,
        })
    }

    pub fn has_usage(&self, usage_id: &str) -> bool {
        self.usages.iter().any(|u| u.usage_id == usage_id)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.tag == tag)
    }

    /// Union of `usage_ids` over rules of `role` whose regex fully
    /// matches `sender`.
    pub fn allowed_usages(&self, sender: &str, role: Role) -> BTreeSet<UsageId> {
        let rules = match role {
            Role::Consumer => &self.consumers,
            Role::Producer => &self.producers,
        };
        rules
            .iter()
            .filter(|rule| rule.matches(sender))
            .flat_map(|rule| rule.usages.iter().cloned())
            .collect()
    }
}
