use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct Health {
    pub status: &'static str,
    pub store: &'static str,
}

/// Body of every JSON error response.
#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub error: String,
}
