//! Input/output column selection.
//!
//! Content-based and hybrid systems pick a set of input columns and one output
//! column; a column is never both. Collaborative systems fill three
//! independent radio slots instead (user id, item id, rating).

use crate::error::ValidationError;
use crate::manifest::{ColumnManifest, ColumnRef};
use crate::model::{ModelConfiguration, SystemType};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

static USER_ID_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(user|customer|member|reader|viewer).*(id|key)").unwrap());
static ITEM_ID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(item|movie|product|book|song|track|article|title).*(id|key)").unwrap()
});
static RATING_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(rating|score)").unwrap());
static GENERIC_ID_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(id|key)$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotRole {
    UserId,
    ItemId,
    Rating,
}

impl SlotRole {
    pub const ALL: [SlotRole; 3] = [SlotRole::UserId, SlotRole::ItemId, SlotRole::Rating];

    pub fn label(self) -> &'static str {
        match self {
            SlotRole::UserId => "User ID column",
            SlotRole::ItemId => "Item ID column",
            SlotRole::Rating => "Rating column",
        }
    }

    fn pattern(self) -> &'static Regex {
        match self {
            SlotRole::UserId => &USER_ID_REGEX,
            SlotRole::ItemId => &ITEM_ID_REGEX,
            SlotRole::Rating => &RATING_REGEX,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    inputs: Vec<ColumnRef>,
    output: Option<ColumnRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleSlots {
    user_id: Option<ColumnRef>,
    item_id: Option<ColumnRef>,
    rating: Option<ColumnRef>,
}

impl RoleSlots {
    fn slot_mut(&mut self, role: SlotRole) -> &mut Option<ColumnRef> {
        match role {
            SlotRole::UserId => &mut self.user_id,
            SlotRole::ItemId => &mut self.item_id,
            SlotRole::Rating => &mut self.rating,
        }
    }

    fn get(&self, role: SlotRole) -> Option<&ColumnRef> {
        match role {
            SlotRole::UserId => self.user_id.as_ref(),
            SlotRole::ItemId => self.item_id.as_ref(),
            SlotRole::Rating => self.rating.as_ref(),
        }
    }

    fn holds(&self, column: &ColumnRef) -> bool {
        SlotRole::ALL
            .iter()
            .any(|role| self.get(*role) == Some(column))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSelectionModel {
    flat: Selection,
    slots: RoleSlots,
}

impl ColumnSelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inputs(&self) -> &[ColumnRef] {
        &self.flat.inputs
    }

    pub fn output(&self) -> Option<&ColumnRef> {
        self.flat.output.as_ref()
    }

    pub fn is_input(&self, column: &ColumnRef) -> bool {
        self.flat.inputs.contains(column)
    }

    pub fn is_output(&self, column: &ColumnRef) -> bool {
        self.flat.output.as_ref() == Some(column)
    }

    pub fn slot(&self, role: SlotRole) -> Option<&ColumnRef> {
        self.slots.get(role)
    }

    /// Adds or removes `column` from the inputs. Adding the current output
    /// clears the output.
    pub fn toggle_input(&mut self, column: ColumnRef) {
        if let Some(pos) = self.flat.inputs.iter().position(|c| *c == column) {
            self.flat.inputs.remove(pos);
            return;
        }
        if self.is_output(&column) {
            self.flat.output = None;
        }
        self.flat.inputs.push(column);
    }

    /// Makes `column` the output, removing it from the inputs if present.
    pub fn set_output(&mut self, column: ColumnRef) {
        self.flat.inputs.retain(|c| *c != column);
        self.flat.output = Some(column);
    }

    pub fn clear_output(&mut self) {
        self.flat.output = None;
    }

    pub fn assign(&mut self, role: SlotRole, column: ColumnRef) {
        *self.slots.slot_mut(role) = Some(column);
    }

    pub fn clear_role(&mut self, role: SlotRole) {
        *self.slots.slot_mut(role) = None;
    }

    pub fn reset(&mut self) {
        self.flat = Selection::default();
        self.slots = RoleSlots::default();
    }

    /// Fills empty collaborative slots from column names. Name-specific
    /// patterns win; remaining id slots fall back to any `*id`/`*key` column.
    pub fn preselect_roles(&mut self, manifest: &ColumnManifest) {
        let columns = manifest.columns();
        for role in [SlotRole::Rating, SlotRole::UserId, SlotRole::ItemId] {
            self.preselect_with(role, role.pattern(), &columns);
        }
        for role in [SlotRole::UserId, SlotRole::ItemId] {
            self.preselect_with(role, &GENERIC_ID_REGEX, &columns);
        }
    }

    fn preselect_with(&mut self, role: SlotRole, pattern: &Regex, columns: &[ColumnRef]) {
        if self.slots.get(role).is_some() {
            return;
        }
        let found = columns
            .iter()
            .find(|c| pattern.is_match(&c.name) && !self.slots.holds(c))
            .cloned();
        if let Some(column) = found {
            debug!("Preselected '{}' as {}", column, role.label());
            *self.slots.slot_mut(role) = Some(column);
        }
    }

    /// The (inputs, output) pair a compile request is built from.
    pub fn resolve(
        &self,
        system_type: SystemType,
    ) -> Result<(Vec<ColumnRef>, ColumnRef), ValidationError> {
        if system_type.uses_role_slots() {
            let missing: Vec<&str> = SlotRole::ALL
                .iter()
                .filter(|role| self.slots.get(**role).is_none())
                .map(|role| role.label())
                .collect();
            return match (&self.slots.user_id, &self.slots.item_id, &self.slots.rating) {
                (Some(user), Some(item), Some(rating)) => {
                    Ok((vec![user.clone(), item.clone()], rating.clone()))
                }
                _ => Err(ValidationError::IncompleteSelection(format!(
                    "please select the {}",
                    missing.join(", ")
                ))),
            };
        }

        if self.flat.inputs.is_empty() {
            return Err(ValidationError::IncompleteSelection(
                "please select at least one input column".to_string(),
            ));
        }
        match &self.flat.output {
            Some(output) => Ok((self.flat.inputs.clone(), output.clone())),
            None => Err(ValidationError::IncompleteSelection(
                "please select an output column".to_string(),
            )),
        }
    }

    /// Re-applies a saved configuration, skipping columns the current
    /// manifest does not have.
    pub fn restore(&mut self, config: &ModelConfiguration, manifest: &ColumnManifest) {
        self.reset();
        let known = |c: &&ColumnRef| manifest.contains(c);
        if config.system_type.uses_role_slots() {
            let mut inputs = config.inputs.iter().filter(known);
            self.slots.user_id = inputs.next().cloned();
            self.slots.item_id = inputs.next().cloned();
            self.slots.rating = Some(&config.output).filter(known).cloned();
        } else {
            self.flat.inputs = config.inputs.iter().filter(known).cloned().collect();
            self.flat.output = Some(&config.output).filter(known).cloned();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Algorithm;

    fn col(name: &str) -> ColumnRef {
        ColumnRef::new(name)
    }

    fn assert_disjoint(model: &ColumnSelectionModel) {
        if let Some(output) = model.output() {
            assert!(!model.inputs().contains(output), "{:?}", model);
        }
    }

    #[test]
    fn input_then_output_moves_column_to_output() {
        let mut model = ColumnSelectionModel::new();
        model.toggle_input(col("age"));
        model.set_output(col("age"));
        assert!(!model.is_input(&col("age")));
        assert!(model.is_output(&col("age")));
    }

    #[test]
    fn output_then_input_clears_output() {
        let mut model = ColumnSelectionModel::new();
        model.set_output(col("label"));
        model.toggle_input(col("label"));
        assert!(model.is_input(&col("label")));
        assert_eq!(model.output(), None);
    }

    #[test]
    fn mutual_exclusion_holds_for_every_operation_order() {
        let columns = ["a", "b", "c"];
        // Every sequence of four operations over three columns.
        for seq in 0..(6usize.pow(4)) {
            let mut model = ColumnSelectionModel::new();
            let mut code = seq;
            for _ in 0..4 {
                let op = code % 6;
                code /= 6;
                let column = col(columns[op % 3]);
                if op < 3 {
                    model.toggle_input(column);
                } else {
                    model.set_output(column);
                }
                assert_disjoint(&model);
            }
        }
    }

    #[test]
    fn toggling_twice_removes_input() {
        let mut model = ColumnSelectionModel::new();
        model.toggle_input(col("age"));
        model.toggle_input(col("income"));
        model.toggle_input(col("age"));
        assert_eq!(model.inputs(), &[col("income")]);
    }

    #[test]
    fn same_name_in_different_files_are_distinct() {
        let mut model = ColumnSelectionModel::new();
        model.toggle_input(ColumnRef::in_file("movieId", "movies.csv"));
        model.set_output(ColumnRef::in_file("movieId", "ratings.csv"));
        assert!(model.is_input(&ColumnRef::in_file("movieId", "movies.csv")));
        assert!(model.is_output(&ColumnRef::in_file("movieId", "ratings.csv")));
    }

    #[test]
    fn resolve_requires_inputs_and_output() {
        let mut model = ColumnSelectionModel::new();
        assert!(matches!(
            model.resolve(SystemType::ContentBased),
            Err(ValidationError::IncompleteSelection(_))
        ));
        model.toggle_input(col("age"));
        assert!(model.resolve(SystemType::Hybrid).is_err());
        model.set_output(col("label"));
        let (inputs, output) = model.resolve(SystemType::Hybrid).unwrap();
        assert_eq!(inputs, vec![col("age")]);
        assert_eq!(output, col("label"));
    }

    #[test]
    fn role_slots_are_radio_and_independent() {
        let mut model = ColumnSelectionModel::new();
        model.assign(SlotRole::UserId, col("userId"));
        model.assign(SlotRole::UserId, col("customer_key"));
        model.assign(SlotRole::ItemId, col("customer_key"));
        assert_eq!(model.slot(SlotRole::UserId), Some(&col("customer_key")));
        assert_eq!(model.slot(SlotRole::ItemId), Some(&col("customer_key")));

        let err = model.resolve(SystemType::Collaborative).unwrap_err();
        assert!(err.to_string().contains("Rating column"));

        model.assign(SlotRole::Rating, col("stars"));
        let (inputs, output) = model.resolve(SystemType::Collaborative).unwrap();
        assert_eq!(inputs, vec![col("customer_key"), col("customer_key")]);
        assert_eq!(output, col("stars"));
    }

    #[test]
    fn heuristic_preselects_user_item_and_rating() {
        let manifest = ColumnManifest::flat(["timestamp", "userId", "movieId", "rating"]);
        let mut model = ColumnSelectionModel::new();
        model.preselect_roles(&manifest);
        assert_eq!(model.slot(SlotRole::UserId), Some(&col("userId")));
        assert_eq!(model.slot(SlotRole::ItemId), Some(&col("movieId")));
        assert_eq!(model.slot(SlotRole::Rating), Some(&col("rating")));
    }

    #[test]
    fn heuristic_falls_back_to_generic_ids_and_keeps_user_choice() {
        let manifest = ColumnManifest::flat(["uid", "sku_key", "score", "price"]);
        let mut model = ColumnSelectionModel::new();
        model.assign(SlotRole::Rating, col("price"));
        model.preselect_roles(&manifest);
        assert_eq!(model.slot(SlotRole::UserId), Some(&col("uid")));
        assert_eq!(model.slot(SlotRole::ItemId), Some(&col("sku_key")));
        assert_eq!(model.slot(SlotRole::Rating), Some(&col("price")));
    }

    #[test]
    fn reset_clears_everything() {
        let mut model = ColumnSelectionModel::new();
        model.toggle_input(col("a"));
        model.set_output(col("b"));
        model.assign(SlotRole::Rating, col("c"));
        model.reset();
        assert_eq!(model, ColumnSelectionModel::new());
    }

    #[test]
    fn restore_skips_unknown_columns() {
        let manifest = ColumnManifest::flat(["age", "label"]);
        let config = ModelConfiguration {
            system_type: SystemType::ContentBased,
            algorithm: Algorithm::TfIdf,
            inputs: vec![col("age"), col("income")],
            output: col("label"),
        };
        let mut model = ColumnSelectionModel::new();
        model.restore(&config, &manifest);
        assert_eq!(model.inputs(), &[col("age")]);
        assert_eq!(model.output(), Some(&col("label")));
    }
}
