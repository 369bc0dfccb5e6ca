// src/controllers/listing.rs
use std::collections::BTreeSet;

use crate::controllers::forms::{InspectionForm, TransformerForm};
use crate::errors::ClientError;
use crate::models::*;
use crate::notify::Notifier;
use crate::services::TransformerApi;

/// A category selector: "All" or one concrete value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection<T> {
    #[default]
    All,
    Only(T),
}

impl<T: PartialEq> Selection<T> {
    pub fn admits(&self, value: Option<&T>) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(wanted) => value == Some(wanted),
        }
    }
}

/// Pure predicate over list entries.
pub trait EntryFilter<T>: Default {
    fn matches(&self, entry: &T) -> bool;

    fn clear(&mut self) {
        *self = Self::default();
    }
}

fn contains_ci(field: Option<&str>, needle: &str) -> bool {
    field.is_some_and(|value| value.to_lowercase().contains(needle))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformerFilter {
    pub search: String,
    pub region: Selection<String>,
    pub kind: Selection<TransformerType>,
}

impl EntryFilter<Transformer> for TransformerFilter {
    fn matches(&self, t: &Transformer) -> bool {
        let q = self.search.trim().to_lowercase();
        let matches_search = q.is_empty()
            || contains_ci(Some(t.transformer_no.as_str()), &q)
            || contains_ci(t.pole_no.as_deref(), &q)
            || contains_ci(t.region.as_deref(), &q);
        matches_search && self.region.admits(t.region.as_ref()) && self.kind.admits(t.transformer_type.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InspectionFilter {
    pub search: String,
    pub status: Selection<InspectionStatus>,
}

impl EntryFilter<Inspection> for InspectionFilter {
    fn matches(&self, i: &Inspection) -> bool {
        let q = self.search.trim().to_lowercase();
        let matches_search = q.is_empty()
            || contains_ci(Some(i.title.as_str()), &q)
            || contains_ci(i.inspector.as_deref(), &q)
            || contains_ci(i.notes.as_deref(), &q);
        matches_search && self.status.admits(Some(&i.status))
    }
}

/// The full fetched list plus its filtered view. The view is recomputed on
/// every change to the list or the filter and never touches the network.
#[derive(Debug)]
pub struct FilteredList<T, F> {
    items: Vec<T>,
    filter: F,
    visible: Vec<usize>,
}

impl<T, F: EntryFilter<T>> Default for FilteredList<T, F> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            filter: F::default(),
            visible: Vec::new(),
        }
    }
}

impl<T, F: EntryFilter<T>> FilteredList<T, F> {
    pub fn new(items: Vec<T>) -> Self {
        let mut list = Self::default();
        list.set_items(items);
        list
    }

    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.recompute();
    }

    pub fn update_filter(&mut self, change: impl FnOnce(&mut F)) {
        change(&mut self.filter);
        self.recompute();
    }

    pub fn clear_filters(&mut self) {
        self.filter.clear();
        self.recompute();
    }

    pub fn filter(&self) -> &F {
        &self.filter
    }

    pub fn all(&self) -> &[T] {
        &self.items
    }

    pub fn filtered(&self) -> impl Iterator<Item = &T> + '_ {
        self.visible.iter().map(|&i| &self.items[i])
    }

    pub fn filtered_len(&self) -> usize {
        self.visible.len()
    }

    /// "3 of 10" style summary.
    pub fn summary(&self) -> String {
        format!("{} of {}", self.visible.len(), self.items.len())
    }

    fn recompute(&mut self) {
        let filter = &self.filter;
        self.visible = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| filter.matches(item))
            .map(|(i, _)| i)
            .collect();
    }
}

/// Transformers page: list, filters and create/edit/delete.
#[derive(Debug, Default)]
pub struct TransformerDirectory {
    pub list: FilteredList<Transformer, TransformerFilter>,
    pub form: TransformerForm,
    loading: bool,
    pub notifier: Notifier,
}

impl TransformerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Distinct regions present in the list, for the region selector.
    pub fn regions(&self) -> Vec<String> {
        self.list
            .all()
            .iter()
            .filter_map(|t| t.region.clone())
            .filter(|r| !r.trim().is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub async fn load(&mut self, api: &dyn TransformerApi) -> Result<(), ClientError> {
        self.loading = true;
        let result = api.list_transformers().await;
        self.loading = false;
        match result {
            Ok(items) => {
                self.list.set_items(items);
                Ok(())
            }
            Err(e) => {
                self.notifier.failure(&e, "Failed to load transformers");
                Err(e)
            }
        }
    }

    /// Creates or updates depending on the form's mode, then reloads.
    pub async fn save(&mut self, api: &dyn TransformerApi) -> Result<(), ClientError> {
        let draft = self.form.validate()?;
        let result = match self.form.editing() {
            Some(id) => api.update_transformer(id, &draft).await,
            None => api.create_transformer(&draft).await,
        };
        match result {
            Ok(()) => {
                let verb = if self.form.editing().is_some() { "updated" } else { "created" };
                self.notifier.success(format!("Transformer {} successfully", verb));
                self.form.reset();
                self.load(api).await
            }
            Err(e) => {
                self.notifier.failure(&e, "Failed to save transformer");
                Err(e)
            }
        }
    }

    pub async fn delete(&mut self, api: &dyn TransformerApi, id: TransformerId) -> Result<(), ClientError> {
        match api.delete_transformer(id).await {
            Ok(()) => {
                self.notifier.success("Transformer deleted successfully");
                if self.form.editing() == Some(id) {
                    self.form.reset();
                }
                self.load(api).await
            }
            Err(e) => {
                self.notifier.failure(&e, "Failed to delete transformer");
                Err(e)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InspectionStats {
    pub total: usize,
    pub open: usize,
    pub in_progress: usize,
    pub closed: usize,
}

/// Inspections page for one transformer.
#[derive(Debug)]
pub struct InspectionBoard {
    transformer_id: TransformerId,
    transformer: Option<Transformer>,
    pub list: FilteredList<Inspection, InspectionFilter>,
    pub form: InspectionForm,
    loading: bool,
    pub notifier: Notifier,
}

impl InspectionBoard {
    pub fn new(transformer_id: TransformerId) -> Self {
        Self {
            transformer_id,
            transformer: None,
            list: FilteredList::default(),
            form: InspectionForm::default(),
            loading: false,
            notifier: Notifier::default(),
        }
    }

    pub fn transformer_id(&self) -> TransformerId {
        self.transformer_id
    }

    pub fn transformer(&self) -> Option<&Transformer> {
        self.transformer.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Fetches the transformer and its inspections side by side.
    pub async fn load(&mut self, api: &dyn TransformerApi) -> Result<(), ClientError> {
        self.loading = true;
        let (transformer, inspections) = tokio::join!(
            api.get_transformer(self.transformer_id),
            api.list_inspections(self.transformer_id)
        );
        self.loading = false;
        match (transformer, inspections) {
            (Ok(t), Ok(items)) => {
                self.transformer = Some(t);
                self.list.set_items(items);
                Ok(())
            }
            (Err(e), _) | (_, Err(e)) => {
                self.notifier.failure(&e, "Failed to load inspections");
                Err(e)
            }
        }
    }

    pub async fn add_inspection(&mut self, api: &dyn TransformerApi) -> Result<(), ClientError> {
        let draft = self.form.begin_submit()?;
        let result = api.create_inspection(self.transformer_id, &draft).await;
        self.form.finish_submit();
        match result {
            Ok(()) => {
                self.notifier.success("Inspection added successfully");
                self.form.reset();
                self.load(api).await
            }
            Err(e) => {
                self.notifier.failure(&e, "Failed to add inspection");
                Err(e)
            }
        }
    }

    pub fn stats(&self) -> InspectionStats {
        let items = self.list.all();
        let count = |status| items.iter().filter(|i| i.status == status).count();
        InspectionStats {
            total: items.len(),
            open: count(InspectionStatus::Open),
            in_progress: count(InspectionStatus::InProgress),
            closed: count(InspectionStatus::Closed),
        }
    }

    pub fn find(&self, id: InspectionId) -> Option<&Inspection> {
        self.list.all().iter().find(|i| i.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transformer(id: i64, no: &str, pole: &str, region: &str, kind: TransformerType) -> Transformer {
        Transformer {
            id,
            transformer_no: no.to_string(),
            pole_no: Some(pole.to_string()),
            region: Some(region.to_string()),
            transformer_type: Some(kind),
        }
    }

    fn sample() -> Vec<Transformer> {
        vec![
            transformer(1, "AZ-8890", "EN-122-A", "Kandy", TransformerType::Bulk),
            transformer(2, "AZ-1649", "EN-122-B", "Colombo", TransformerType::Distribution),
            transformer(3, "AX-8993", "EN-123-A", "Galle", TransformerType::Distribution),
            transformer(4, "AY-8790", "KAN-7", "Colombo", TransformerType::Bulk),
        ]
    }

    fn ids(list: &FilteredList<Transformer, TransformerFilter>) -> Vec<i64> {
        list.filtered().map(|t| t.id).collect()
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let mut list = FilteredList::<_, TransformerFilter>::new(sample());
        list.update_filter(|f| f.search = "kan".to_string());
        assert_eq!(ids(&list), vec![1, 4]);

        list.update_filter(|f| f.search = "en-122".to_string());
        assert_eq!(ids(&list), vec![1, 2]);
    }

    #[test]
    fn filters_are_conjunctive() {
        let mut list = FilteredList::<_, TransformerFilter>::new(sample());
        list.update_filter(|f| f.region = Selection::Only("Colombo".to_string()));
        assert_eq!(ids(&list), vec![2, 4]);

        list.update_filter(|f| f.kind = Selection::Only(TransformerType::Bulk));
        assert_eq!(ids(&list), vec![4]);

        list.update_filter(|f| f.search = "az".to_string());
        assert!(ids(&list).is_empty());
        assert_eq!(list.summary(), "0 of 4");
    }

    #[test]
    fn clearing_restores_full_list() {
        let mut list = FilteredList::<_, TransformerFilter>::new(sample());
        list.update_filter(|f| {
            f.search = "zzz".to_string();
            f.kind = Selection::Only(TransformerType::Distribution);
        });
        assert_eq!(list.filtered_len(), 0);
        list.clear_filters();
        assert_eq!(list.filter(), &TransformerFilter::default());
        assert_eq!(list.filtered_len(), 4);
    }

    #[test]
    fn new_items_are_filtered_immediately() {
        let mut list = FilteredList::<_, TransformerFilter>::default();
        list.update_filter(|f| f.region = Selection::Only("Galle".to_string()));
        list.set_items(sample());
        assert_eq!(ids(&list), vec![3]);
    }

    #[test]
    fn missing_region_fails_a_specific_region_filter() {
        let mut t = transformer(9, "B-1", "P", "", TransformerType::Bulk);
        t.region = None;
        let filter = TransformerFilter {
            region: Selection::Only("Kandy".to_string()),
            ..Default::default()
        };
        assert!(!filter.matches(&t));
        assert!(TransformerFilter::default().matches(&t));
    }

    #[test]
    fn inspection_search_and_status() {
        let inspection = |id, title: &str, notes: Option<&str>, status| Inspection {
            id,
            transformer_id: Some(1),
            title: title.to_string(),
            inspector: Some("Ruwan".to_string()),
            notes: notes.map(str::to_string),
            status,
            created_at: None,
        };
        let mut list = FilteredList::<_, InspectionFilter>::new(vec![
            inspection(1, "Quarterly scan", Some("Hot spot on phase B"), InspectionStatus::Open),
            inspection(2, "Annual", None, InspectionStatus::Closed),
        ]);
        list.update_filter(|f| f.search = "HOT SPOT".to_string());
        assert_eq!(list.filtered().map(|i| i.id).collect::<Vec<_>>(), vec![1]);

        list.update_filter(|f| {
            f.search = "ruwan".to_string();
            f.status = Selection::Only(InspectionStatus::Closed);
        });
        assert_eq!(list.filtered().map(|i| i.id).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn regions_are_distinct_and_sorted() {
        let mut dir = TransformerDirectory::new();
        dir.list.set_items(sample());
        assert_eq!(dir.regions(), vec!["Colombo", "Galle", "Kandy"]);
    }
}
