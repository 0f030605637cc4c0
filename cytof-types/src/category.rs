use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;

/// A categorical value stored as a small integer code into a [`Codebook`].
pub trait Category: Copy + Eq + Ord + Hash + Debug + Send + Sync {
    fn from_code(code: u32) -> Self;
    fn code(self) -> u32;
}

/// Stimulation condition of a sample. Used only by the two-sample tester.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClassLabel(pub u32);

/// Permutation stratum of a sample, typically the donor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Stratum(pub u32);

impl Category for ClassLabel {
    fn from_code(code: u32) -> Self {
        ClassLabel(code)
    }
    fn code(self) -> u32 {
        self.0
    }
}

impl Category for Stratum {
    fn from_code(code: u32) -> Self {
        Stratum(code)
    }
    fn code(self) -> u32 {
        self.0
    }
}

/// Ordered set of category names. Codes are assigned in first-seen order.
#[derive(Clone, Debug)]
pub struct Codebook<C> {
    names: Vec<String>,
    _category: PhantomData<C>,
}

impl<C> Default for Codebook<C> {
    fn default() -> Self {
        Codebook {
            names: Vec::new(),
            _category: PhantomData,
        }
    }
}

impl<C: Category> Codebook<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a codebook from names, dropping repeats while keeping first-seen order.
    pub fn from_names<S: AsRef<str>>(names: impl IntoIterator<Item = S>) -> Self {
        let mut book = Self::new();
        for name in names {
            book.encode(name.as_ref());
        }
        book
    }

    /// Return the code for `name`, adding it if not yet present.
    pub fn encode(&mut self, name: &str) -> C {
        match self.get(name) {
            Some(c) => c,
            None => {
                self.names.push(name.to_string());
                C::from_code((self.names.len() - 1) as u32)
            }
        }
    }

    /// Look up the code of a name. Returns None if the name is not present.
    pub fn get(&self, name: &str) -> Option<C> {
        self.names.iter().position(|x| x == name).map(|i| C::from_code(i as u32))
    }

    pub fn name(&self, category: C) -> Option<&str> {
        self.names.get(category.code() as usize).map(String::as_str)
    }

    pub fn contains(&self, category: C) -> bool {
        (category.code() as usize) < self.names.len()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// All categories in code order.
    pub fn categories(&self) -> impl Iterator<Item = C> + '_ {
        (0..self.names.len()).map(|i| C::from_code(i as u32))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Group positions of `values` by category. Groups are ordered by category code and the
/// positions inside each group are ascending.
pub fn group_indices<C: Category>(values: &[C]) -> BTreeMap<C, Vec<usize>> {
    let mut groups: BTreeMap<C, Vec<usize>> = BTreeMap::new();
    for (i, &v) in values.iter().enumerate() {
        groups.entry(v).or_default().push(i);
    }
    groups
}
