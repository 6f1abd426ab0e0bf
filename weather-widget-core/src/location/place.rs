use crate::model::Placemark;

pub const UNKNOWN_LOCATION: &str = "Unknown location";

/// Outcome of turning a placemark into something the screen can show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceResolution {
    /// Both locality and sub-locality are known.
    Detailed {
        locality: String,
        sub_locality: String,
    },
    /// Only the locality is known; it becomes the weather query key.
    Locality(String),
    Unknown,
}

impl PlaceResolution {
    pub fn label(&self) -> String {
        match self {
            PlaceResolution::Detailed {
                locality,
                sub_locality,
            } => format!("{locality}, {sub_locality}"),
            PlaceResolution::Locality(locality) => locality.clone(),
            PlaceResolution::Unknown => UNKNOWN_LOCATION.to_string(),
        }
    }

    /// New weather query key, if this resolution carries one.
    pub fn query_key(&self) -> Option<&str> {
        match self {
            PlaceResolution::Locality(locality) => Some(locality),
            PlaceResolution::Detailed { .. } | PlaceResolution::Unknown => None,
        }
    }
}

pub fn resolve_place(placemark: &Placemark) -> PlaceResolution {
    let locality = non_empty(&placemark.locality);
    let sub_locality = non_empty(&placemark.sub_locality);

    match (locality, sub_locality) {
        (Some(locality), Some(sub_locality)) => PlaceResolution::Detailed {
            locality: locality.to_string(),
            sub_locality: sub_locality.to_string(),
        },
        (Some(locality), None) => PlaceResolution::Locality(locality.to_string()),
        (None, _) => PlaceResolution::Unknown,
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
