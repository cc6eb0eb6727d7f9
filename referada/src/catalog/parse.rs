//! Conversion of the portal's nested materials response into a [`Catalog`].
//!
//! The portal answers with a tree of semesters, study years, subjects,
//! material categories and materials. Every level is deserialized into an
//! explicit record so that a missing key is reported at the parse boundary
//! instead of surfacing later as an absent value.

use std::collections::BTreeMap;

use serde::de::{Deserializer, Error as _};
use serde::Deserialize;
use serde_json::Value;

use super::error::CatalogError;
use super::{Catalog, Course, FileRecord, Materials};

/// Parse a materials response that has already been decoded as JSON.
pub fn parse_materials(raw: Value) -> Result<Catalog, CatalogError> {
    let response: MaterialsResponse =
        serde_json::from_value(raw).map_err(CatalogError::malformed)?;
    Ok(response.into_catalog())
}

/// Parse a materials response from its JSON text.
pub fn parse_materials_str(raw: &str) -> Result<Catalog, CatalogError> {
    let response: MaterialsResponse = serde_json::from_str(raw).map_err(CatalogError::malformed)?;
    Ok(response.into_catalog())
}

#[derive(Debug, Deserialize)]
struct MaterialsResponse {
    data: Vec<RawSemester>,
}

#[derive(Debug, Deserialize)]
struct RawSemester {
    #[serde(rename = "akademskaGodina")]
    academic_year: String,
    #[serde(rename = "semestar")]
    semester: String,
    #[serde(rename = "godine")]
    years: Vec<RawYear>,
}

#[derive(Debug, Deserialize)]
struct RawYear {
    #[serde(rename = "studij")]
    track: Value,
    #[serde(rename = "smjer")]
    subtrack: Value,
    #[serde(rename = "godina")]
    year: Value,
    #[serde(rename = "nacin")]
    enrollment: Value,
    #[serde(rename = "grupa")]
    group: Value,
    #[serde(rename = "predmeti")]
    subjects: Vec<RawSubject>,
}

#[derive(Debug, Deserialize)]
struct RawSubject {
    #[serde(rename = "idPredmet", deserialize_with = "id_string")]
    id: String,
    #[serde(rename = "predmet")]
    name: String,
    #[serde(rename = "sifra")]
    code: Value,
    ects: Value,
    #[serde(rename = "potpis")]
    signature: Value,
    #[serde(rename = "potpisDatum")]
    signature_date: Value,
    #[serde(rename = "ocjena")]
    grade: Value,
    #[serde(rename = "ocjenaOpisno")]
    grade_desc: Value,
    #[serde(rename = "ocjenaDatum")]
    grade_date: Value,
    #[serde(rename = "polozenBezOcjene")]
    passed_nograde: Value,
    #[serde(rename = "polozenBezOcjeneKolokviran")]
    passed_nograde_kolok: Value,
    #[serde(rename = "priznat")]
    accepted: Value,
    #[serde(rename = "priznatCertifikat")]
    accepted_cert: Value,
    #[serde(rename = "dodatno")]
    extra: RawExtra,
}

#[derive(Debug, Deserialize)]
struct RawExtra {
    #[serde(rename = "materijali")]
    materials: RawMaterials,
}

#[derive(Debug, Deserialize)]
struct RawMaterials {
    #[serde(rename = "brojMaterijala")]
    count: Value,
    #[serde(rename = "zadnjaIzmjenaDanUTjednu")]
    last_changed_dotw: Value,
    #[serde(rename = "zadnjaIzmjenaDatum")]
    last_changed_date: Value,
    #[serde(rename = "zadnjaIzmjenaKorisnik")]
    last_changed_user: Value,
    #[serde(rename = "kategorije")]
    categories: Vec<RawCategory>,
}

#[derive(Debug, Deserialize)]
struct RawCategory {
    #[serde(rename = "kategorija")]
    name: String,
    #[serde(rename = "materijali")]
    materials: Vec<RawMaterial>,
}

#[derive(Debug, Deserialize)]
struct RawMaterial {
    #[serde(deserialize_with = "id_string")]
    id: String,
    #[serde(rename = "naziv")]
    filename: String,
    #[serde(rename = "opis")]
    description: Value,
    #[serde(rename = "velicina")]
    bytes: Value,
    #[serde(rename = "vrijeme")]
    date_uploaded: Value,
    #[serde(rename = "korisnika")]
    user_uploaded: Value,
    #[serde(rename = "contentType")]
    content_type: Value,
    #[serde(rename = "link")]
    url: String,
    #[serde(rename = "kategorija")]
    category: String,
}

/// Identifiers arrive as strings or integers; both become map keys.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "expected string or integer identifier, found {}",
            other
        ))),
    }
}

impl MaterialsResponse {
    fn into_catalog(self) -> Catalog {
        let mut catalog = Catalog::new();

        for semester in self.data {
            for mut year in semester.years {
                let subjects = std::mem::take(&mut year.subjects);
                for subject in subjects {
                    let (id, course) =
                        build_course(&semester.academic_year, &semester.semester, &year, subject);
                    if catalog.insert(id.clone(), course).is_some() {
                        tracing::debug!(course = %id, "Course listed more than once, keeping last entry");
                    }
                }
            }
        }

        catalog
    }
}

fn build_course(
    academic_year: &str,
    semester: &str,
    year: &RawYear,
    subject: RawSubject,
) -> (String, Course) {
    let RawSubject {
        id,
        name,
        code,
        ects,
        signature,
        signature_date,
        grade,
        grade_desc,
        grade_date,
        passed_nograde,
        passed_nograde_kolok,
        accepted,
        accepted_cert,
        extra,
    } = subject;
    let raw = extra.materials;

    let mut files = BTreeMap::new();
    for category in raw.categories {
        let mapping: &mut BTreeMap<String, FileRecord> = files.entry(category.name).or_default();
        for material in category.materials {
            mapping.insert(
                material.id,
                FileRecord {
                    filename: material.filename,
                    description: material.description,
                    bytes: material.bytes,
                    date_uploaded: material.date_uploaded,
                    user_uploaded: material.user_uploaded,
                    content_type: material.content_type,
                    url: material.url,
                    downloaded: false,
                    subject_name: name.clone(),
                    subject_code: code.clone(),
                    subject_id: id.clone(),
                    mat_category: material.category,
                },
            );
        }
    }

    let course = Course {
        academic_year: academic_year.to_string(),
        semester: semester.to_string(),
        track: year.track.clone(),
        subtrack: year.subtrack.clone(),
        year: year.year.clone(),
        enrollment: year.enrollment.clone(),
        group: year.group.clone(),
        name,
        code,
        ects,
        signature,
        signature_date,
        grade,
        grade_desc,
        grade_date,
        passed_nograde,
        passed_nograde_kolok,
        accepted,
        accepted_cert,
        materials: Materials {
            count: raw.count,
            last_changed_dotw: raw.last_changed_dotw,
            last_changed_date: raw.last_changed_date,
            last_changed_user: raw.last_changed_user,
            files,
        },
    };

    (id, course)
}
