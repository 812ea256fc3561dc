//! Ad composition: the draft form and the requests built from it.
//!
//! Budget and targeting values are opaque to the engine. They are kept as
//! typed fields only so the form can round-trip them through the store.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::catalog::SelectionSet;
use crate::error::{EngineError, EngineResult};
use crate::protocol::{AdMethod, AdTargetType, CreateAdRequest, GenerateAdRequest};
use crate::store::StateStore;

pub mod keys {
    pub const DESCRIPTION: &str = "ad_product_desc";
    pub const PROMOTE_URL: &str = "promoteUrl";
    pub const CPM: &str = "cpm";
    pub const VIEWS_PER_USER: &str = "viewsPerUser";
    pub const BUDGET: &str = "budget";
    pub const DAILY_BUDGET: &str = "dailyBudget";
    pub const ACTIVE: &str = "active";
    pub const TARGET_TYPE: &str = "targetType";
    pub const METHOD: &str = "method";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdField {
    Description,
    AdText,
    PromoteUrl,
    Cpm,
    ViewsPerUser,
    Budget,
    DailyBudget,
    Active,
    TargetType,
    Method,
}

impl AdField {
    pub const ALL: [AdField; 10] = [
        AdField::Description,
        AdField::AdText,
        AdField::PromoteUrl,
        AdField::Cpm,
        AdField::ViewsPerUser,
        AdField::Budget,
        AdField::DailyBudget,
        AdField::Active,
        AdField::TargetType,
        AdField::Method,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AdField::Description => "Product",
            AdField::AdText => "Ad text",
            AdField::PromoteUrl => "Promote URL",
            AdField::Cpm => "CPM",
            AdField::ViewsPerUser => "Views/user",
            AdField::Budget => "Budget",
            AdField::DailyBudget => "Daily budget",
            AdField::Active => "Active",
            AdField::TargetType => "Target",
            AdField::Method => "Method",
        }
    }

    /// Fields that cycle through fixed values instead of taking text.
    pub fn is_choice(self) -> bool {
        matches!(self, AdField::Active | AdField::TargetType | AdField::Method)
    }
}

pub struct AdDraft {
    pub description: String,
    /// Generated or hand-written ad text. Not persisted.
    pub ad_text: String,
    pub promote_url: String,
    pub cpm: f64,
    pub views_per_user: u32,
    pub budget: f64,
    pub daily_budget: f64,
    pub active: bool,
    pub target_type: AdTargetType,
    pub method: AdMethod,
    store: Arc<dyn StateStore>,
}

impl AdDraft {
    pub fn restore(store: Arc<dyn StateStore>) -> Self {
        Self {
            description: store.load(keys::DESCRIPTION, String::new()),
            ad_text: String::new(),
            promote_url: store.load(keys::PROMOTE_URL, String::new()),
            cpm: store.load(keys::CPM, 0.1),
            views_per_user: store.load(keys::VIEWS_PER_USER, 0),
            budget: store.load(keys::BUDGET, 0.1),
            daily_budget: store.load(keys::DAILY_BUDGET, 0.1),
            active: store.load(keys::ACTIVE, false),
            target_type: store.load(keys::TARGET_TYPE, AdTargetType::Channel),
            method: store.load(keys::METHOD, AdMethod::Draft),
            store,
        }
    }

    pub fn display(&self, field: AdField) -> String {
        match field {
            AdField::Description => self.description.clone(),
            AdField::AdText => self.ad_text.clone(),
            AdField::PromoteUrl => self.promote_url.clone(),
            AdField::Cpm => self.cpm.to_string(),
            AdField::ViewsPerUser => self.views_per_user.to_string(),
            AdField::Budget => self.budget.to_string(),
            AdField::DailyBudget => self.daily_budget.to_string(),
            AdField::Active => if self.active { "yes" } else { "no" }.to_string(),
            AdField::TargetType => self.target_type.label().to_string(),
            AdField::Method => self.method.label().to_string(),
        }
    }

    /// Set a text or numeric field from user input. The value is saved on success.
    pub fn set_text(&mut self, field: AdField, input: &str) -> EngineResult<()> {
        match field {
            AdField::Description => {
                self.description = input.to_string();
                self.persist(keys::DESCRIPTION, &self.description);
            }
            AdField::AdText => self.ad_text = input.to_string(),
            AdField::PromoteUrl => {
                self.promote_url = input.trim().to_string();
                self.persist(keys::PROMOTE_URL, &self.promote_url);
            }
            AdField::Cpm => {
                self.cpm = parse_amount(field, input)?;
                self.persist(keys::CPM, &self.cpm);
            }
            AdField::ViewsPerUser => {
                self.views_per_user = input.trim().parse().map_err(|_| {
                    EngineError::validation(format!("{} must be a whole number", field.label()))
                })?;
                self.persist(keys::VIEWS_PER_USER, &self.views_per_user);
            }
            AdField::Budget => {
                self.budget = parse_amount(field, input)?;
                self.persist(keys::BUDGET, &self.budget);
            }
            AdField::DailyBudget => {
                self.daily_budget = parse_amount(field, input)?;
                self.persist(keys::DAILY_BUDGET, &self.daily_budget);
            }
            AdField::Active | AdField::TargetType | AdField::Method => self.cycle(field),
        }
        Ok(())
    }

    /// Advance a choice field to its next value.
    pub fn cycle(&mut self, field: AdField) {
        match field {
            AdField::Active => {
                self.active = !self.active;
                self.persist(keys::ACTIVE, &self.active);
            }
            AdField::TargetType => {
                self.target_type = self.target_type.next();
                self.persist(keys::TARGET_TYPE, &self.target_type);
            }
            AdField::Method => {
                self.method = self.method.toggle();
                self.persist(keys::METHOD, &self.method);
            }
            _ => {}
        }
    }

    fn persist<T: Serialize>(&self, key: &str, value: &T) {
        if let Err(e) = self.store.save(key, value) {
            warn!("[store] failed to save {}: {:#}", key, e);
        }
    }
}

fn parse_amount(field: AdField, input: &str) -> EngineResult<f64> {
    match input.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(EngineError::validation(format!(
            "{} must be a non-negative number",
            field.label()
        ))),
    }
}

fn require_selection(selection: &SelectionSet) -> EngineResult<Vec<String>> {
    if selection.is_empty() {
        return Err(EngineError::validation("select at least one channel first"));
    }
    Ok(selection.as_slice().to_vec())
}

pub fn generate_request(selection: &SelectionSet, draft: &AdDraft) -> EngineResult<GenerateAdRequest> {
    let channels_names = require_selection(selection)?;
    if draft.description.trim().is_empty() {
        return Err(EngineError::validation("enter a product description first"));
    }
    Ok(GenerateAdRequest {
        channels_names,
        description: draft.description.clone(),
    })
}

pub fn create_request(selection: &SelectionSet, draft: &AdDraft) -> EngineResult<CreateAdRequest> {
    let channels = require_selection(selection)?;
    if draft.ad_text.trim().is_empty() {
        return Err(EngineError::validation("ad text is empty"));
    }
    Ok(CreateAdRequest {
        text: draft.ad_text.clone(),
        promote_url: draft.promote_url.clone(),
        cpm: draft.cpm,
        views_per_user: draft.views_per_user,
        budget: draft.budget,
        daily_budget: draft.daily_budget,
        active: draft.active,
        target_type: draft.target_type,
        channels,
        method: draft.method,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn store() -> Arc<dyn StateStore> {
        Arc::new(MemoryStore::new())
    }

    #[test]
    fn defaults_match_the_form() {
        let draft = AdDraft::restore(store());
        assert_eq!(draft.cpm, 0.1);
        assert_eq!(draft.views_per_user, 0);
        assert_eq!(draft.budget, 0.1);
        assert_eq!(draft.daily_budget, 0.1);
        assert!(!draft.active);
        assert_eq!(draft.target_type, AdTargetType::Channel);
        assert_eq!(draft.method, AdMethod::Draft);
    }

    #[test]
    fn fields_persist_under_their_keys() {
        let store = store();
        let mut draft = AdDraft::restore(Arc::clone(&store));
        draft.set_text(AdField::Description, "VPN service").unwrap();
        draft.set_text(AdField::Cpm, " 1.5 ").unwrap();
        draft.set_text(AdField::ViewsPerUser, "3").unwrap();
        draft.cycle(AdField::TargetType);
        draft.cycle(AdField::Active);
        draft.set_text(AdField::AdText, "not saved").unwrap();

        assert_eq!(store.load(keys::CPM, 0.0), 1.5);
        assert_eq!(store.load::<String>(keys::TARGET_TYPE, String::new()), "search");

        let again = AdDraft::restore(store);
        assert_eq!(again.description, "VPN service");
        assert_eq!(again.views_per_user, 3);
        assert!(again.active);
        assert_eq!(again.target_type, AdTargetType::Search);
        assert_eq!(again.ad_text, "");
    }

    #[test]
    fn bad_numbers_are_rejected_and_keep_old_value() {
        let mut draft = AdDraft::restore(store());
        let err = draft.set_text(AdField::Budget, "-2").unwrap_err();
        assert!(err.is_validation());
        assert!(draft.set_text(AdField::ViewsPerUser, "1.5").is_err());
        assert_eq!(draft.budget, 0.1);
        assert_eq!(draft.views_per_user, 0);
    }

    #[test]
    fn requests_need_selection_and_text() {
        let store = store();
        let mut selection = SelectionSet::empty(Arc::clone(&store));
        let mut draft = AdDraft::restore(store);

        assert!(generate_request(&selection, &draft).unwrap_err().is_validation());
        selection.add("durov");
        assert!(generate_request(&selection, &draft).is_err());
        draft.description = "coffee".into();
        let req = generate_request(&selection, &draft).unwrap();
        assert_eq!(req.channels_names, vec!["durov".to_string()]);

        assert!(create_request(&selection, &draft).unwrap_err().is_validation());
        draft.ad_text = "Best coffee".into();
        let req = create_request(&selection, &draft).unwrap();
        assert_eq!(req.channels, vec!["durov".to_string()]);
        assert_eq!(req.method, AdMethod::Draft);
    }
}
