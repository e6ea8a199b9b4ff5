//! Paging and sorting requests and their results.

use std::future::Future;

use serde::Serialize;

use crate::errors::{DomainError, RepositoryError};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// One sort key: an entity property and its direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub property: String,
    pub direction: Direction,
}

impl Order {
    pub fn asc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: Direction::Desc,
        }
    }
}

/// Ordered list of sort keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Sort {
    orders: Vec<Order>,
}

impl Sort {
    pub fn unsorted() -> Self {
        Self::default()
    }

    /// Sorts by each of `properties` in the same direction
    ///
    /// # Example
    /// ```
    /// use member_store::domain::paging::{Direction, Sort};
    ///
    /// let sort = Sort::by(Direction::Desc, &["username"]);
    /// assert_eq!(sort.orders().len(), 1);
    /// ```
    pub fn by(direction: Direction, properties: &[&str]) -> Self {
        Self {
            orders: properties
                .iter()
                .map(|p| Order {
                    property: (*p).to_string(),
                    direction,
                })
                .collect(),
        }
    }

    /// Appends the keys of `other` after this sort's keys
    pub fn and(mut self, other: Sort) -> Self {
        self.orders.extend(other.orders);
        self
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn is_unsorted(&self) -> bool {
        self.orders.is_empty()
    }

    /// Renders an `ORDER BY` clause.
    ///
    /// `columns` maps property names to SQL column expressions; a property
    /// outside that list is rejected. `tiebreaker` is appended unless the
    /// sort already names it, so paging over duplicate keys stays stable.
    pub(crate) fn to_order_by(
        &self,
        columns: &[(&str, &str)],
        tiebreaker: &str,
    ) -> Result<String, RepositoryError> {
        let mut parts = Vec::with_capacity(self.orders.len() + 1);
        let mut has_tiebreaker = false;

        for order in &self.orders {
            let column = columns
                .iter()
                .find(|(property, _)| *property == order.property)
                .map(|(_, column)| *column)
                .ok_or_else(|| RepositoryError::InvalidSortProperty(order.property.clone()))?;

            has_tiebreaker |= column == tiebreaker;
            parts.push(format!("{} {}", column, order.direction.as_sql()));
        }

        if !has_tiebreaker {
            parts.push(format!("{} ASC", tiebreaker));
        }

        Ok(format!("ORDER BY {}", parts.join(", ")))
    }
}

/// Zero-based page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    size: u32,
    sort: Sort,
}

impl PageRequest {
    /// # Errors
    /// `DomainError::InvalidPageSize` when `size` is zero.
    pub fn of(page: u32, size: u32) -> Result<Self, DomainError> {
        Self::of_sorted(page, size, Sort::unsorted())
    }

    pub fn of_sorted(page: u32, size: u32, sort: Sort) -> Result<Self, DomainError> {
        if size == 0 {
            return Err(DomainError::InvalidPageSize);
        }
        Ok(Self { page, size, sort })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page) * i64::from(self.size)
    }

    /// Total row count implied by a short content fetch, if any.
    ///
    /// A page holding fewer rows than requested is the last one, so the
    /// total is known without running the count query. An empty page beyond
    /// the first tells nothing and still needs the count.
    pub fn known_total(&self, fetched: usize) -> Option<i64> {
        let fetched = fetched as i64;
        if fetched >= i64::from(self.size) {
            return None;
        }
        if fetched > 0 || self.offset() == 0 {
            Some(self.offset() + fetched)
        } else {
            None
        }
    }

    /// Resolves the total row count for a page that fetched `fetched` rows.
    ///
    /// `count` runs only when `known_total` cannot answer.
    pub async fn total_or_count<F, Fut, E>(&self, fetched: usize, count: F) -> Result<i64, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<i64, E>>,
    {
        match self.known_total(fetched) {
            Some(total) => Ok(total),
            None => count().await,
        }
    }

    /// Request for the following page with the same size and sort.
    ///
    /// The page index stops at `u32::MAX`.
    pub fn next(&self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            size: self.size,
            sort: self.sort.clone(),
        }
    }
}

/// A page of results together with the total row count
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    content: Vec<T>,
    number: u32,
    size: u32,
    total_elements: i64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: i64) -> Self {
        Self {
            content,
            number: request.page(),
            size: request.size(),
            total_elements,
        }
    }

    pub fn content(&self) -> &[T] {
        &self.content
    }

    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    /// Zero-based page index
    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn number_of_elements(&self) -> usize {
        self.content.len()
    }

    pub fn total_elements(&self) -> i64 {
        self.total_elements
    }

    pub fn total_pages(&self) -> i64 {
        let size = i64::from(self.size);
        if size == 0 {
            return 0;
        }
        (self.total_elements + size - 1) / size
    }

    pub fn is_first(&self) -> bool {
        self.number == 0
    }

    pub fn is_last(&self) -> bool {
        !self.has_next()
    }

    pub fn has_next(&self) -> bool {
        i64::from(self.number) + 1 < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 0
    }

    /// Converts the content while keeping the paging metadata
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
        }
    }
}

/// A page of results that only knows whether another page follows
#[derive(Debug, Clone, Serialize)]
pub struct Slice<T> {
    content: Vec<T>,
    number: u32,
    size: u32,
    has_next: bool,
}

impl<T> Slice<T> {
    /// Builds a slice from rows fetched with a limit of `size + 1`
    pub fn from_overfetched(mut rows: Vec<T>, request: &PageRequest) -> Self {
        let size = request.size() as usize;
        let has_next = rows.len() > size;
        rows.truncate(size);

        Self {
            content: rows,
            number: request.page(),
            size: request.size(),
            has_next,
        }
    }

    pub fn content(&self) -> &[T] {
        &self.content
    }

    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn number_of_elements(&self) -> usize {
        self.content.len()
    }

    pub fn has_next(&self) -> bool {
        self.has_next
    }

    pub fn is_first(&self) -> bool {
        self.number == 0
    }

    pub fn map<U, F>(self, f: F) -> Slice<U>
    where
        F: FnMut(T) -> U,
    {
        Slice {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            has_next: self.has_next,
        }
    }
}
