//! # Metadata Field Catalogue
//!
//! CashID requests name the metadata they want with a compact encoding: a
//! namespace letter (`i`dentity, `p`osition, `c`ontact) followed by one digit
//! code per field. `r=i12c1` asks for name, family and email.
//!
//! The catalogue is fixed by the protocol; (namespace, code) <-> name is
//! bijective.

use crate::domain::errors::CashIdError;

/// The three metadata namespaces of the protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldNamespace {
    Identity,
    Position,
    Contact,
}

impl FieldNamespace {
    /// Catalogue iteration order. Compact encoding is namespace-major in
    /// this order.
    pub const ALL: [FieldNamespace; 3] = [
        FieldNamespace::Identity,
        FieldNamespace::Position,
        FieldNamespace::Contact,
    ];

    /// The namespace letter used on the wire.
    pub fn letter(self) -> char {
        match self {
            FieldNamespace::Identity => 'i',
            FieldNamespace::Position => 'p',
            FieldNamespace::Contact => 'c',
        }
    }

    /// Reverse of [`letter`](Self::letter). Non-namespace characters yield
    /// `None`.
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'i' => Some(FieldNamespace::Identity),
            'p' => Some(FieldNamespace::Position),
            'c' => Some(FieldNamespace::Contact),
            _ => None,
        }
    }
}

/// One immutable entry of the field catalogue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub namespace: FieldNamespace,
    pub code: char,
    pub name: &'static str,
}

const fn entry(namespace: FieldNamespace, code: char, name: &'static str) -> FieldSpec {
    FieldSpec {
        namespace,
        code,
        name,
    }
}

/// The complete catalogue, namespace-major.
///
/// Valid codes per namespace: identity 1-6, 8, 9; position 1-6, 9;
/// contact 1-5.
pub const FIELD_CATALOG: &[FieldSpec] = &[
    entry(FieldNamespace::Identity, '1', "name"),
    entry(FieldNamespace::Identity, '2', "family"),
    entry(FieldNamespace::Identity, '3', "nickname"),
    entry(FieldNamespace::Identity, '4', "age"),
    entry(FieldNamespace::Identity, '5', "gender"),
    entry(FieldNamespace::Identity, '6', "birthdate"),
    entry(FieldNamespace::Identity, '8', "picture"),
    entry(FieldNamespace::Identity, '9', "national"),
    entry(FieldNamespace::Position, '1', "country"),
    entry(FieldNamespace::Position, '2', "state"),
    entry(FieldNamespace::Position, '3', "city"),
    entry(FieldNamespace::Position, '4', "streetname"),
    entry(FieldNamespace::Position, '5', "streetnumber"),
    entry(FieldNamespace::Position, '6', "residence"),
    entry(FieldNamespace::Position, '9', "coordinates"),
    entry(FieldNamespace::Contact, '1', "email"),
    entry(FieldNamespace::Contact, '2', "instant"),
    entry(FieldNamespace::Contact, '3', "social"),
    entry(FieldNamespace::Contact, '4', "phone"),
    entry(FieldNamespace::Contact, '5', "postal"),
];

/// Look up the field name for a (namespace, code) pair.
pub fn name_for_code(namespace: FieldNamespace, code: char) -> Result<&'static str, CashIdError> {
    FIELD_CATALOG
        .iter()
        .find(|f| f.namespace == namespace && f.code == code)
        .map(|f| f.name)
        .ok_or_else(|| CashIdError::UnsupportedField {
            field: format!("{}{}", namespace.letter(), code),
        })
}

/// Look up the (namespace, code) pair for a field name.
pub fn code_for_name(name: &str) -> Result<(FieldNamespace, char), CashIdError> {
    FIELD_CATALOG
        .iter()
        .find(|f| f.name == name)
        .map(|f| (f.namespace, f.code))
        .ok_or_else(|| CashIdError::UnsupportedField {
            field: name.to_string(),
        })
}

/// Encode a list of field names into the compact wire form.
///
/// Fields are grouped namespace-major (identity, position, contact); within a
/// namespace they keep the order they were supplied in. Any name outside the
/// catalogue fails the whole list.
pub fn encode_field_list<S: AsRef<str>>(names: &[S]) -> Result<String, CashIdError> {
    let coded = names
        .iter()
        .map(|n| code_for_name(n.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    let mut encoded = String::new();
    for namespace in FieldNamespace::ALL {
        let codes: String = coded
            .iter()
            .filter(|(ns, _)| *ns == namespace)
            .map(|(_, code)| *code)
            .collect();
        if !codes.is_empty() {
            encoded.push(namespace.letter());
            encoded.push_str(&codes);
        }
    }
    Ok(encoded)
}

/// Decode a compact field list into field names.
///
/// Scans left to right; a namespace letter switches the active namespace and
/// is itself not a field. A code before any namespace letter, or an unknown
/// (namespace, code) pair, fails with the offending character. Nothing is
/// silently dropped.
pub fn decode_field_list(encoded: &str) -> Result<Vec<String>, CashIdError> {
    let mut active: Option<FieldNamespace> = None;
    let mut fields = Vec::new();

    for character in encoded.chars() {
        if let Some(namespace) = FieldNamespace::from_letter(character) {
            active = Some(namespace);
            continue;
        }
        let namespace = active.ok_or(CashIdError::MalformedFieldList { character })?;
        match name_for_code(namespace, character) {
            Ok(name) => fields.push(name.to_string()),
            Err(_) => return Err(CashIdError::MalformedFieldList { character }),
        }
    }

    Ok(fields)
}
