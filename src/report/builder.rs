//! AuthorReportBuilder: per-entity duplicate state and its text report

use super::grouping::{connected_components, union_find_groups};
use super::render::{self, CHAIN_SEPARATOR};
use crate::model::{Entity, EntityError, Reference};
use crate::sink::{write_atomically, SinkResult};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::info;

/// Unordered pair of unique identifiers, stored smallest first
pub type IdPair = (String, String);

pub fn ordered_pair(a: String, b: String) -> IdPair {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Everything known about one entity's references.
///
/// References are first-write-wins: a second reference with an already known
/// unique identifier is ignored. Pairs are unordered and deduplicated.
#[derive(Debug, Clone)]
pub struct AuthorReportBuilder {
    entity: Entity,
    main_entity_id: String,
    references: BTreeMap<String, Reference>,
    trivial_duplicates: BTreeSet<IdPair>,
    potential_duplicates: BTreeSet<IdPair>,
}

impl AuthorReportBuilder {
    /// Fails when the entity carries none of the known identifier types.
    pub fn new(entity: Entity) -> Result<Self, EntityError> {
        let main_entity_id = entity.main_entity_id()?.to_string();
        Ok(Self {
            entity,
            main_entity_id,
            references: BTreeMap::new(),
            trivial_duplicates: BTreeSet::new(),
            potential_duplicates: BTreeSet::new(),
        })
    }

    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    pub fn main_entity_id(&self) -> &str {
        &self.main_entity_id
    }

    /// Insert unless the unique identifier is already known.
    pub fn add_reference(&mut self, reference: &Reference) {
        self.references
            .entry(reference.unique_identifier())
            .or_insert_with(|| reference.clone());
    }

    pub fn reference(&self, unique_identifier: &str) -> Option<&Reference> {
        self.references.get(unique_identifier)
    }

    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    /// Record a certain duplicate; the pair stops being a potential one.
    pub fn add_trivial_duplicate(&mut self, reference1: &Reference, reference2: &Reference) {
        if let Some(pair) = Self::pair_of(reference1, reference2) {
            self.potential_duplicates.remove(&pair);
            self.trivial_duplicates.insert(pair);
        }
    }

    /// Record an uncertain duplicate, unless the pair is already trivial.
    pub fn add_potential_duplicate(&mut self, reference1: &Reference, reference2: &Reference) {
        if let Some(pair) = Self::pair_of(reference1, reference2) {
            if !self.trivial_duplicates.contains(&pair) {
                self.potential_duplicates.insert(pair);
            }
        }
    }

    /// A reference is never paired with itself.
    fn pair_of(reference1: &Reference, reference2: &Reference) -> Option<IdPair> {
        let (a, b) = (reference1.unique_identifier(), reference2.unique_identifier());
        (a != b).then(|| ordered_pair(a, b))
    }

    pub fn get_trivial_duplicates(&self) -> &BTreeSet<IdPair> {
        &self.trivial_duplicates
    }

    pub fn get_potential_duplicates(&self) -> &BTreeSet<IdPair> {
        &self.potential_duplicates
    }

    /// Render the report from the current state.
    ///
    /// Visual ids are assigned afresh on every call: `R{n}` for references
    /// outside any trivial group, `G{n}` for members of trivial group `n`.
    pub fn generate_report(&self) -> Vec<String> {
        let mut lines = render::entity_header(&self.entity);
        let mut visual_ids: HashMap<&str, String> = HashMap::new();

        let groups = union_find_groups(&self.trivial_duplicates);
        let grouped: BTreeSet<&str> = groups.iter().flatten().map(String::as_str).collect();

        render::subtitle(&mut lines, "Not Duplicated References:");
        let singles = self
            .references
            .iter()
            .filter(|(id, _)| !grouped.contains(id.as_str()));
        for (n, (id, reference)) in singles.enumerate() {
            let visual_id = format!("R{}", n + 1);
            lines.push(render::reference_block(reference, &visual_id));
            lines.push(String::new());
            visual_ids.insert(id, visual_id);
        }

        render::subtitle(&mut lines, "Trivial Duplicate Groups");
        for (g, group) in groups.iter().enumerate() {
            let group_number = g + 1;
            lines.push(render::group_header(group_number));
            let known = group.iter().filter_map(|id| self.references.get_key_value(id));
            for (r, (id, reference)) in known.enumerate() {
                let visual_id = format!("G{}-R{}", group_number, r + 1);
                lines.push(render::reference_block(reference, &visual_id));
                lines.push(String::new());
                visual_ids.insert(id, format!("G{}", group_number));
            }
        }

        let visual = |id: &str| visual_ids.get(id).cloned().unwrap_or_else(|| id.to_string());

        render::subtitle(&mut lines, "Pairs of Potential Duplicates");
        let mut printed: BTreeSet<(String, String)> = BTreeSet::new();
        for (a, b) in &self.potential_duplicates {
            let (visual_a, visual_b) = (visual(a.as_str()), visual(b.as_str()));
            if printed.contains(&(visual_b.clone(), visual_a.clone())) {
                continue;
            }
            if !printed.insert((visual_a.clone(), visual_b.clone())) {
                continue;
            }
            render::boxed(
                &mut lines,
                format!("Pair {}: {}{}{}", printed.len(), visual_a, CHAIN_SEPARATOR, visual_b),
                format!("Identifiers: {}{}{}", a, CHAIN_SEPARATOR, b),
            );
        }

        render::subtitle(&mut lines, "Chain of potential Duplicates");
        for (n, chain) in connected_components(&self.potential_duplicates).iter().enumerate() {
            let mut visual_chain: Vec<String> = Vec::new();
            for id in chain {
                let label = visual(id.as_str());
                if !visual_chain.contains(&label) {
                    visual_chain.push(label);
                }
            }
            render::boxed(
                &mut lines,
                format!("Chain n°{} : {}", n + 1, visual_chain.join(CHAIN_SEPARATOR)),
                format!("Identifiers: {}", chain.join(CHAIN_SEPARATOR)),
            );
        }
        lines.push(render::closing_rule());

        lines
    }

    /// Path of this entity's report inside `directory`.
    ///
    /// Path separators in the id become `_`, so the file always lands
    /// directly inside `directory`.
    pub fn report_path(&self, directory: &Path) -> PathBuf {
        let file_stem: String = self
            .main_entity_id
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        directory.join(format!("{}.txt", file_stem))
    }

    /// Write the report to `<directory>/<main_entity_id>.txt`, replacing any
    /// previous version.
    pub fn dump_report(&self, directory: &Path) -> SinkResult<PathBuf> {
        let path = self.report_path(directory);
        write_atomically(&path, &self.generate_report().join("\n"))?;
        info!(path = %path.display(), references = self.references.len(), "report dumped");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity() -> Entity {
        Entity::new("Jeanne Dupont")
            .with_identifier("orcid", "0000-0001")
            .with_identifier("idref", "123")
    }

    fn builder() -> AuthorReportBuilder {
        AuthorReportBuilder::new(entity()).unwrap()
    }

    fn reference(id: &str) -> Reference {
        Reference::new("hal", id).with_title(format!("Title {}", id))
    }

    #[test]
    fn first_write_wins_for_references() {
        let mut builder = builder();
        builder.add_reference(&reference("a"));
        builder.add_reference(&Reference::new("hal", "a").with_title("Changed"));
        assert_eq!(builder.reference_count(), 1);
        assert_eq!(
            builder.reference("hal-a").unwrap().titles[0].value,
            "Title a"
        );
    }

    #[test]
    fn pairs_are_unordered_and_deduplicated() {
        let mut builder = builder();
        let (a, b) = (reference("a"), reference("b"));
        builder.add_trivial_duplicate(&a, &b);
        builder.add_trivial_duplicate(&b, &a);
        builder.add_trivial_duplicate(&a, &a);
        let first = builder.get_trivial_duplicates().clone();
        assert_eq!(first.len(), 1);
        assert!(first.contains(&("hal-a".to_string(), "hal-b".to_string())));
        assert_eq!(builder.get_trivial_duplicates(), &first);

        let c = reference("c");
        builder.add_potential_duplicate(&c, &a);
        builder.add_potential_duplicate(&a, &c);
        assert_eq!(builder.get_potential_duplicates().len(), 1);
    }

    #[test]
    fn trivial_and_potential_pairs_stay_disjoint() {
        let mut builder = builder();
        let (a, b) = (reference("a"), reference("b"));
        builder.add_potential_duplicate(&a, &b);
        builder.add_trivial_duplicate(&b, &a);
        assert!(builder.get_potential_duplicates().is_empty());

        builder.add_potential_duplicate(&a, &b);
        assert!(builder.get_potential_duplicates().is_empty());
        assert_eq!(builder.get_trivial_duplicates().len(), 1);
    }

    #[test]
    fn entity_without_known_identifier_is_rejected() {
        assert!(AuthorReportBuilder::new(Entity::new("Nobody")).is_err());
    }

    #[test]
    fn report_labels_singles_groups_pairs_and_chains() {
        let mut builder = builder();
        let refs: Vec<Reference> = ["a", "b", "c", "d", "e"].iter().map(|id| reference(id)).collect();
        for r in &refs {
            builder.add_reference(r);
        }
        builder.add_trivial_duplicate(&refs[0], &refs[1]);
        builder.add_trivial_duplicate(&refs[1], &refs[2]);
        builder.add_potential_duplicate(&refs[2], &refs[3]);
        builder.add_potential_duplicate(&refs[3], &refs[4]);

        let report = builder.generate_report();
        assert_eq!(report[0], "Author: Jeanne Dupont");
        assert_eq!(report[1], "Identifiers: orcid: 0000-0001, idref: 123\n");

        let text = report.join("\n");
        assert!(text.contains("Reference n°R1\n\t"));
        assert!(text.contains("Reference n°R2\n\t"));
        assert!(text.contains("Group n°1"));
        assert!(text.contains("Reference n°G1-R1"));
        assert!(text.contains("Reference n°G1-R3"));
        assert!(!text.contains("Group n°2"));
        assert!(text.contains("\tPair 1: G1 <---> R1"));
        assert!(text.contains("\tPair 2: R1 <---> R2"));
        assert!(text.contains("\tIdentifiers: hal-c <---> hal-d"));
        assert!(text.contains("\tChain n°1 : G1 <---> R1 <---> R2"));
        assert!(text.contains("\tIdentifiers: hal-c <---> hal-d <---> hal-e"));
        assert_eq!(report.last().unwrap(), &"=".repeat(50));
    }

    #[test]
    fn pairs_collapsing_to_same_visual_ids_are_printed_once() {
        let mut builder = builder();
        let refs: Vec<Reference> = ["a", "b", "x"].iter().map(|id| reference(id)).collect();
        for r in &refs {
            builder.add_reference(r);
        }
        builder.add_trivial_duplicate(&refs[0], &refs[1]);
        builder.add_potential_duplicate(&refs[0], &refs[2]);
        builder.add_potential_duplicate(&refs[2], &refs[1]);

        let text = builder.generate_report().join("\n");
        assert_eq!(text.matches("\tPair ").count(), 1);
        assert!(text.contains("\tChain n°1 : G1 <---> R1"));
    }

    #[test]
    fn report_is_idempotent_and_reflects_growth() {
        let mut builder = builder();
        builder.add_reference(&reference("a"));
        let first = builder.generate_report();
        assert_eq!(first, builder.generate_report());

        builder.add_reference(&reference("b"));
        builder.add_trivial_duplicate(&reference("a"), &reference("b"));
        let grown = builder.generate_report().join("\n");
        assert!(grown.contains("Reference n°G1-R2"));
        assert!(!grown.contains("Reference n°R1"));
    }

    #[test]
    fn dump_report_writes_file_named_by_main_id() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = builder();
        builder.add_reference(&reference("a"));

        let path = builder.dump_report(dir.path()).unwrap();
        assert_eq!(path, dir.path().join("123.txt"));
        let first = std::fs::read_to_string(&path).unwrap();
        assert_eq!(first, builder.generate_report().join("\n"));

        builder.add_reference(&reference("b"));
        builder.dump_report(dir.path()).unwrap();
        let second = std::fs::read_to_string(&path).unwrap();
        assert!(second.contains("Reference n°R2"));
    }

    #[test]
    fn report_path_stays_inside_directory() {
        let dir = tempfile::tempdir().unwrap();
        let entity = Entity::new("Jeanne Dupont").with_identifier("idref", "../escaped");
        let builder = AuthorReportBuilder::new(entity).unwrap();

        let path = builder.report_path(dir.path());
        assert_eq!(path, dir.path().join(".._escaped.txt"));
        assert_eq!(path.parent(), Some(dir.path()));

        builder.dump_report(dir.path()).unwrap();
        assert!(path.exists());
        assert!(!dir.path().parent().unwrap().join("escaped.txt").exists());
    }
}
