//! Recovery of per-file download state from the previous run's snapshot.

use super::Catalog;

/// Summary of a snapshot merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Courses whose materials are unchanged since the snapshot.
    pub courses_unchanged: usize,
    /// Courses present in the snapshot with a different change date.
    pub courses_changed: usize,
    /// Courses that the snapshot does not know about.
    pub courses_new: usize,
    /// Files whose `downloaded` flag was carried over.
    pub flags_recovered: usize,
}

/// Carry `downloaded` flags from `snapshot` into a freshly parsed `catalog`.
///
/// A flag is recovered only when the course exists in both catalogs with an
/// equal `last_changed_date` and the same category and file id exist in the
/// snapshot with `downloaded == true`. Everything else keeps the value the
/// parser produced. The snapshot is never otherwise consulted.
pub fn merge_snapshot(snapshot: &Catalog, catalog: &mut Catalog) -> MergeStats {
    let mut stats = MergeStats::default();

    for (course_id, course) in catalog.iter_mut() {
        let Some(previous) = snapshot.get(course_id) else {
            stats.courses_new += 1;
            continue;
        };

        if previous.materials.last_changed_date != course.materials.last_changed_date {
            stats.courses_changed += 1;
            tracing::debug!(course = %course_id, "Materials changed since last run");
            continue;
        }
        stats.courses_unchanged += 1;

        for (category, files) in course.materials.files.iter_mut() {
            let Some(previous_files) = previous.materials.files.get(category) else {
                continue;
            };

            for (file_id, file) in files.iter_mut() {
                if previous_files.get(file_id).is_some_and(|old| old.downloaded) {
                    file.downloaded = true;
                    stats.flags_recovered += 1;
                }
            }
        }
    }

    tracing::info!(
        unchanged = stats.courses_unchanged,
        changed = stats.courses_changed,
        new = stats.courses_new,
        recovered = stats.flags_recovered,
        "Merged previous snapshot"
    );

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::{add_file, course};
    use crate::catalog::FileKey;
    use proptest::prelude::*;

    fn fresh(changed: &str) -> Catalog {
        let mut catalog = Catalog::new();
        catalog.insert("101", course("Algoritmi", "2022/2023", "Zimski", changed));
        add_file(&mut catalog, "101", "Predavanja", "1", "uvod.pdf");
        add_file(&mut catalog, "101", "Predavanja", "2", "sortiranje.pdf");
        add_file(&mut catalog, "101", "Vježbe", "3", "lab1.pdf");
        catalog
    }

    #[test]
    fn test_merge_with_empty_snapshot_is_noop() {
        let mut catalog = fresh("2022-10-01");
        let expected = catalog.clone();

        let stats = merge_snapshot(&Catalog::new(), &mut catalog);

        assert_eq!(catalog, expected);
        assert_eq!(stats.courses_new, 1);
        assert_eq!(stats.flags_recovered, 0);
    }

    #[test]
    fn test_merge_recovers_flags_for_unchanged_course() {
        let mut snapshot = fresh("2022-10-01");
        snapshot.mark_downloaded(&FileKey::new("101", "Predavanja", "1"));
        snapshot.mark_downloaded(&FileKey::new("101", "Vježbe", "3"));

        let mut catalog = fresh("2022-10-01");
        // File added after the snapshot was taken.
        add_file(&mut catalog, "101", "Predavanja", "4", "grafovi.pdf");

        let stats = merge_snapshot(&snapshot, &mut catalog);

        assert!(catalog.file(&FileKey::new("101", "Predavanja", "1")).unwrap().downloaded);
        assert!(catalog.file(&FileKey::new("101", "Vježbe", "3")).unwrap().downloaded);
        assert!(!catalog.file(&FileKey::new("101", "Predavanja", "2")).unwrap().downloaded);
        assert!(!catalog.file(&FileKey::new("101", "Predavanja", "4")).unwrap().downloaded);
        assert_eq!(stats.courses_unchanged, 1);
        assert_eq!(stats.flags_recovered, 2);
    }

    #[test]
    fn test_merge_ignores_changed_course() {
        let mut snapshot = fresh("2022-10-01");
        for (key, _) in fresh("2022-10-01").files() {
            snapshot.mark_downloaded(&key);
        }

        let mut catalog = fresh("2022-11-15");
        let expected = catalog.clone();

        let stats = merge_snapshot(&snapshot, &mut catalog);

        assert_eq!(catalog, expected);
        assert_eq!(stats.courses_changed, 1);
        assert_eq!(stats.flags_recovered, 0);
    }

    #[test]
    fn test_merge_requires_same_category() {
        let mut snapshot = fresh("2022-10-01");
        snapshot.mark_downloaded(&FileKey::new("101", "Predavanja", "1"));

        // Same file id, moved to another category.
        let mut catalog = Catalog::new();
        catalog.insert("101", course("Algoritmi", "2022/2023", "Zimski", "2022-10-01"));
        add_file(&mut catalog, "101", "Arhiva", "1", "uvod.pdf");

        merge_snapshot(&snapshot, &mut catalog);

        assert!(!catalog.file(&FileKey::new("101", "Arhiva", "1")).unwrap().downloaded);
    }

    #[test]
    fn test_merge_takes_other_fields_from_fresh_catalog() {
        let mut snapshot = fresh("2022-10-01");
        let key = FileKey::new("101", "Predavanja", "1");
        snapshot.mark_downloaded(&key);
        snapshot.file_mut(&key).unwrap().filename = "stari-naziv.pdf".to_string();

        let mut catalog = fresh("2022-10-01");
        merge_snapshot(&snapshot, &mut catalog);

        let file = catalog.file(&key).unwrap();
        assert!(file.downloaded);
        assert_eq!(file.filename, "uvod.pdf");
    }

    proptest! {
        #[test]
        fn prop_downloaded_is_monotonic_for_unchanged_courses(
            snapshot_flags in proptest::collection::vec(any::<bool>(), 3),
            same_date in any::<bool>(),
        ) {
            let mut snapshot = fresh("2022-10-01");
            let keys: Vec<FileKey> = snapshot.files().map(|(key, _)| key).collect();
            for (key, flag) in keys.iter().zip(&snapshot_flags) {
                if *flag {
                    snapshot.mark_downloaded(key);
                }
            }

            let mut catalog = fresh(if same_date { "2022-10-01" } else { "2023-03-01" });
            merge_snapshot(&snapshot, &mut catalog);

            for (key, flag) in keys.iter().zip(&snapshot_flags) {
                let merged = catalog.file(key).unwrap().downloaded;
                prop_assert_eq!(merged, same_date && *flag);
            }
        }
    }
}
