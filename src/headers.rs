use std::collections::BTreeMap;

/// Request headers with lower-cased names, kept sorted for SigV4 canonicalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
	inner: BTreeMap<String, String>,
}

impl Headers {
	pub fn new() -> Self {
		Self::default()
	}

	/// Insert a header, lower-casing the name. Returns the previous value if any.
	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
		self.inner.insert(name.into().to_lowercase(), value.into())
	}

	pub fn get(&self, name: &str) -> Option<&str> {
		self.inner.get(&name.to_lowercase()).map(String::as_str)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.inner.contains_key(&name.to_lowercase())
	}

	/// Overlay `other` on top of `self`; values from `other` win.
	pub fn merge(&mut self, other: Headers) {
		self.inner.extend(other.inner);
	}

	/// Same as [`Headers::merge`] but consuming, for builder-style chaining.
	pub fn merged(mut self, other: Headers) -> Self {
		self.merge(other);
		self
	}

	pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
		self.inner.iter()
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.inner.keys().map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.inner.len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}
}

// region:    --- Froms

impl<K, V, const N: usize> From<[(K, V); N]> for Headers
where
	K: Into<String>,
	V: Into<String>,
{
	fn from(pairs: [(K, V); N]) -> Self {
		pairs.into_iter().collect()
	}
}

impl<K, V> FromIterator<(K, V)> for Headers
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut headers = Headers::new();
		for (name, value) in iter {
			headers.insert(name, value);
		}
		headers
	}
}

// endregion: --- Froms

// region:    --- Tests


// endregion: --- Tests
