use serde::Serialize;

/// The `{success, message, data, ...}` wrapper every response is sent in.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T = ()> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl<T> Envelope<T> {
    fn empty(success: bool) -> Self {
        Self {
            success,
            message: None,
            data: None,
            count: None,
            deleted_count: None,
            error: None,
            path: None,
        }
    }

    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            ..Self::empty(true)
        }
    }

    pub fn message<M: Into<String>>(mut self, message: M) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn deleted_count(mut self, deleted_count: usize) -> Self {
        self.deleted_count = Some(deleted_count);
        self
    }
}

impl Envelope {
    pub fn success<M: Into<String>>(message: M) -> Self {
        Self::empty(true).message(message)
    }

    pub fn failure<M: Into<String>>(message: M) -> Self {
        Self::empty(false).message(message)
    }

    pub fn error(mut self, error: Option<String>) -> Self {
        self.error = error;
        self
    }

    pub fn path<P: Into<String>>(mut self, path: P) -> Self {
        self.path = Some(path.into());
        self
    }
}
