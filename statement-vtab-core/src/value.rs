/// Dynamically typed value following SQLite's storage classes.
///
/// Every variant but `Null` wraps an `Option` so that a typed NULL can be
/// expressed, `Value::Null` stands for a NULL of unknown type.
#[derive(Default, Debug, Clone)]
pub enum Value {
    #[default]
    Null,
    Int64(Option<i64>),
    Float64(Option<f64>),
    Varchar(Option<String>),
    Blob(Option<Box<[u8]>>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int64(l), Self::Int64(r)) => l == r,
            (Self::Float64(l), Self::Float64(r)) => l == r,
            (Self::Varchar(l), Self::Varchar(r)) => l == r,
            (Self::Blob(l), Self::Blob(r)) => l == r,
            _ => self.is_null() && other.is_null(),
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(
            self,
            Value::Null
                | Value::Int64(None)
                | Value::Float64(None)
                | Value::Varchar(None)
                | Value::Blob(None)
        )
    }
}
