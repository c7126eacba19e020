//! Cheap pair predicates that flag candidate noise

use super::normalize::normalize;
use crate::model::Reference;

/// True when one source identifier contains the other, e.g. ScanR's
/// `halhal-02954829` republishing HAL's `hal-02954829`.
pub fn identifiers_from_same_source(reference1: &Reference, reference2: &Reference) -> bool {
    let source1 = reference1.source_identifier.as_str();
    let source2 = reference2.source_identifier.as_str();
    !source1.is_empty()
        && !source2.is_empty()
        && (source1.contains(source2) || source2.contains(source1))
}

/// True when both references carry an identical (type, value) identifier.
pub fn share_identifier(reference1: &Reference, reference2: &Reference) -> bool {
    reference1
        .identifiers
        .iter()
        .any(|id1| reference2.identifiers.iter().any(|id2| id1 == id2))
}

/// True when every title normalizes to one of the meaningless `common`
/// titles ("Préface", "Introduction", ...). An empty title list is not common.
pub fn all_common_titles<'a, S: AsRef<str>>(
    titles: impl IntoIterator<Item = &'a str>,
    common: &[S],
) -> bool {
    let common: Vec<String> = common.iter().map(|t| normalize(t.as_ref())).collect();
    let mut seen_any = false;
    for title in titles {
        seen_any = true;
        if !common.contains(&normalize(title)) {
            return false;
        }
    }
    seen_any
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contained_source_identifiers_are_same_source() {
        let hal = Reference::new("hal", "hal-02954829");
        let scanr = Reference::new("scanR", "halhal-02954829");
        assert!(identifiers_from_same_source(&hal, &scanr));
        assert!(identifiers_from_same_source(&scanr, &hal));

        let other = Reference::new("scanR", "doi10.1/x");
        assert!(!identifiers_from_same_source(&hal, &other));
    }

    #[test]
    fn empty_source_identifiers_never_match() {
        let empty = Reference::new("hal", "");
        let other = Reference::new("scanR", "abc");
        assert!(!identifiers_from_same_source(&empty, &other));
    }

    #[test]
    fn shared_identifier_is_exact() {
        let r1 = Reference::new("hal", "1").with_identifier("doi", "10.1/x");
        let r2 = Reference::new("hal", "2").with_identifier("doi", "10.1/x");
        let r3 = Reference::new("hal", "3").with_identifier("doi", "10.1/X");
        assert!(share_identifier(&r1, &r2));
        assert!(!share_identifier(&r1, &r3));
    }

    #[test]
    fn common_titles_require_every_title_to_be_common() {
        let common = ["Préface", "Introduction", "Preface"];
        assert!(all_common_titles(["PREFACE", "introduction."], &common));
        assert!(!all_common_titles(["Préface", "Deep learning"], &common));
        assert!(!all_common_titles(Vec::<&str>::new(), &common));
    }
}
