use formats::{GeoJsonError, GeographyDocument};

#[derive(Debug)]
pub enum LoadError {
    /// The request was cancelled by teardown or a newer load.
    Aborted,
    Fetch(String),
    Parse(GeoJsonError),
}

impl LoadError {
    pub fn is_aborted(&self) -> bool {
        matches!(self, LoadError::Aborted)
    }
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Aborted => write!(f, "geography load aborted"),
            LoadError::Fetch(msg) => write!(f, "geography fetch failed: {msg}"),
            LoadError::Parse(e) => write!(f, "geography parse failed: {e}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GeoJsonError> for LoadError {
    fn from(e: GeoJsonError) -> Self {
        LoadError::Parse(e)
    }
}

/// Handle for one in-flight geography request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

/// Tracks which geography request is current. Results for any other
/// ticket are discarded without touching engine state.
#[derive(Debug, Clone, Default)]
pub struct GeographyLoader {
    generation: u64,
    in_flight: bool,
    completed: bool,
}

impl GeographyLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// `true` once a current ticket has delivered a parsed document.
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Starts a new request, invalidating any earlier ticket.
    pub fn begin(&mut self) -> LoadTicket {
        self.generation += 1;
        self.in_flight = true;
        self.completed = false;
        LoadTicket {
            generation: self.generation,
        }
    }

    /// Invalidates the current ticket. Returns `true` if one was in flight.
    pub fn cancel(&mut self) -> bool {
        let was = self.in_flight;
        self.generation += 1;
        self.in_flight = false;
        was
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        self.in_flight && ticket.generation == self.generation
    }

    /// Resolves a ticket with the fetched body. Stale tickets yield `None`.
    pub fn accept(
        &mut self,
        ticket: LoadTicket,
        body: Result<String, LoadError>,
    ) -> Option<Result<GeographyDocument, LoadError>> {
        if !self.is_current(ticket) {
            tracing::debug!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale geography result"
            );
            return None;
        }
        self.in_flight = false;

        let result = body.and_then(|text| Ok(GeographyDocument::from_geojson_str(&text)?));
        self.completed = result.is_ok();
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY: &str = r#"{ "type": "FeatureCollection", "features": [] }"#;

    #[test]
    fn current_ticket_parses_body() {
        let mut loader = GeographyLoader::new();
        let t = loader.begin();
        assert!(loader.is_in_flight());
        let doc = loader.accept(t, Ok(EMPTY.to_string())).unwrap().unwrap();
        assert!(doc.features.is_empty());
        assert!(loader.is_completed());
        assert!(!loader.is_in_flight());
    }

    #[test]
    fn cancelled_or_superseded_tickets_are_dropped() {
        let mut loader = GeographyLoader::new();
        let first = loader.begin();
        let second = loader.begin();
        assert!(loader.accept(first, Ok(EMPTY.to_string())).is_none());

        assert!(loader.cancel());
        assert!(loader.accept(second, Ok(EMPTY.to_string())).is_none());
        assert!(!loader.is_completed());
        assert!(!loader.cancel());
    }

    #[test]
    fn errors_are_surfaced_once() {
        let mut loader = GeographyLoader::new();
        let t = loader.begin();
        let err = loader
            .accept(t, Ok("{ \"type\": \"Feature\" }".to_string()))
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, LoadError::Parse(GeoJsonError::NotAFeatureCollection)));
        assert!(loader.accept(t, Ok(EMPTY.to_string())).is_none());

        let t = loader.begin();
        let err = loader.accept(t, Err(LoadError::Aborted)).unwrap().unwrap_err();
        assert!(err.is_aborted());
    }
}
