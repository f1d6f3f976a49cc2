use std::str::FromStr;

use super::error::TypeError;

pub type FormData = Vec<(String, String)>;

/// Query string parameters, keeping repeated keys such as `tags=a&tags=b`.
#[derive(Debug, Default, Clone)]
pub struct Form {
    inner: FormData,
}

impl Form {
    pub fn from_data(data: FormData) -> Self {
        Self { inner: data }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<String> {
        self.inner
            .iter()
            .filter(|(k, v)| k == key && !v.is_empty())
            .map(|(_, v)| v.to_owned())
            .collect()
    }

    pub fn get_number<T>(&self, key: &str) -> Result<Option<T>, TypeError>
    where
        T: FromStr,
    {
        match self.get_str(key) {
            Some(value) if !value.is_empty() => value
                .parse()
                .map(Some)
                .map_err(|_e| TypeError::new(&format!("Invalid value for {key}"))),
            _ => Ok(None),
        }
    }

    /// `1`/`true` switch a flag filter on; anything else leaves it off.
    pub fn get_flag(&self, key: &str) -> bool {
        matches!(self.get_str(key), Some("1") | Some("true") | Some("True"))
    }
}
