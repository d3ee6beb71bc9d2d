// A single search request against the API, before encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchQuery<'a> {
    Games { name: &'a str },   // Games whose name matches
    Users { lookup: &'a str }, // Users matched by name, url or social handle
}

impl<'a> SearchQuery<'a> {
    pub fn games(name: &'a str) -> Self {
        SearchQuery::Games { name }
    }

    pub fn users(lookup: &'a str) -> Self {
        SearchQuery::Users { lookup }
    }

    // Path relative to the API base URL
    pub fn path(&self) -> &'static str {
        match self {
            SearchQuery::Games { .. } => "/games",
            SearchQuery::Users { .. } => "/users",
        }
    }

    // Query parameters, encoded later by reqwest
    pub fn params(&self) -> Vec<(&'static str, &'a str)> {
        match *self {
            // Bulk mode returns the abbreviated game records
            SearchQuery::Games { name } => vec![("name", name), ("_bulk", "yes")],
            SearchQuery::Users { lookup } => vec![("lookup", lookup)],
        }
    }
}
