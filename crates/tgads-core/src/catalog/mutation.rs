use tracing::{info, warn};

use crate::api::CatalogApi;
use crate::catalog::fetcher::Fetcher;
use crate::channel::{ChannelId, MetaField};
use crate::error::EngineResult;

/// One category or geo edit on one channel.
///
/// The local record changes only after the backend accepted the value.
/// There is no retry and no conflict check: the last write to reach the
/// backend wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEdit {
    pub id: ChannelId,
    pub field: MetaField,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Applied,
    /// Accepted remotely, but the record is no longer in the collection.
    Detached,
}

impl FieldEdit {
    pub fn new(id: ChannelId, field: MetaField, value: impl Into<String>) -> Self {
        Self {
            id,
            field,
            value: value.into(),
        }
    }

    pub async fn send<A: CatalogApi>(&self, api: &A) -> EngineResult<()> {
        match self.field {
            MetaField::Category => api.set_category(self.id, &self.value).await,
            MetaField::Geo => api.set_geo(self.id, &self.value).await,
        }
    }

    /// Reconcile the remote result into the collection.
    pub fn apply(&self, fetcher: &mut Fetcher, result: EngineResult<()>) -> EngineResult<EditOutcome> {
        if let Err(e) = result {
            warn!("[edit] {} of {} -> {:?} failed: {}", self.field, self.id, self.value, e);
            return Err(e);
        }
        if fetcher.patch_field(self.id, self.field, &self.value) {
            info!("[edit] {} of {} set to {:?}", self.field, self.id, self.value);
            Ok(EditOutcome::Applied)
        } else {
            info!("[edit] {} of {} saved; channel no longer listed", self.field, self.id);
            Ok(EditOutcome::Detached)
        }
    }
}

/// Send `edit` and reconcile in one step, for callers that own the fetcher
/// across the await.
pub async fn set_field<A: CatalogApi>(
    api: &A,
    fetcher: &mut Fetcher,
    edit: &FieldEdit,
) -> EngineResult<EditOutcome> {
    let result = edit.send(api).await;
    edit.apply(fetcher, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fetcher::{FetchRequest, TaxonomyFilter};
    use crate::channel::ChannelRecord;
    use crate::config::FailurePolicy;
    use crate::error::EngineError;

    fn loaded() -> Fetcher {
        let mut f = Fetcher::new(FailurePolicy::Discard);
        let t = f.begin(FetchRequest::Catalog(TaxonomyFilter::default()));
        let mut a = ChannelRecord::new(42, "a");
        a.category = "news".into();
        let mut b = ChannelRecord::new(7, "b");
        b.category = "news".into();
        f.complete(t.seq(), Ok(vec![a, b]));
        f
    }

    #[test]
    fn success_patches_only_the_target() {
        let mut f = loaded();
        let edit = FieldEdit::new(42, MetaField::Category, "tech");
        assert_eq!(edit.apply(&mut f, Ok(())), Ok(EditOutcome::Applied));
        assert_eq!(f.get(42).map(|r| r.category.as_str()), Some("tech"));
        assert_eq!(f.get(7).map(|r| r.category.as_str()), Some("news"));
    }

    #[test]
    fn failure_leaves_record_untouched() {
        let mut f = loaded();
        let edit = FieldEdit::new(42, MetaField::Category, "tech");
        let err = edit.apply(&mut f, Err(EngineError::transport("forbidden")));
        assert_eq!(err, Err(EngineError::transport("forbidden")));
        assert_eq!(f.get(42).map(|r| r.category.as_str()), Some("news"));
    }

    #[test]
    fn success_after_record_left() {
        let mut f = loaded();
        let edit = FieldEdit::new(1000, MetaField::Geo, "de");
        assert_eq!(edit.apply(&mut f, Ok(())), Ok(EditOutcome::Detached));
    }
}
