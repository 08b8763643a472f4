use crate::model::Account;

/// Inclusive bounds on an account's following count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DegreeRange {
    pub min: u64,
    pub max: u64,
}

impl DegreeRange {
    pub fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, following_count: u64) -> bool {
        (self.min..=self.max).contains(&following_count)
    }
}

impl Default for DegreeRange {
    fn default() -> Self {
        Self::new(25, 100)
    }
}

/// Keep the accounts whose following count falls inside `range`.
pub fn filter_by_degree<'a, I>(accounts: I, range: DegreeRange) -> impl Iterator<Item = &'a Account>
where
    I: IntoIterator<Item = &'a Account>,
{
    accounts
        .into_iter()
        .filter(move |a| range.contains(a.following_count))
}
