//! Chainable builder for JQL expressions.
//!
//! ```ignore
//! let jql = JqlBuilder::new()
//!   .project("PROJ")
//!   .assigned_to("dev@acme.io")
//!   .not_in_status(["Done"])
//!   .order_by("updated", SortOrder::Desc)
//!   .build();
//! // project = "PROJ" AND assignee = "dev@acme.io" AND status NOT IN ("Done") ORDER BY updated DESC
//! ```
//!
//! Every value is emitted as a quoted JQL string with backslashes and double
//! quotes escaped, so caller text can't break out of its clause.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
  Asc,
  Desc,
}

impl SortOrder {
  pub fn as_str(self) -> &'static str {
    match self {
      SortOrder::Asc => "ASC",
      SortOrder::Desc => "DESC",
    }
  }
}

/// Accumulates AND-joined predicates and at most one ORDER BY.
#[derive(Debug, Clone, Default)]
pub struct JqlBuilder {
  conditions: Vec<String>,
  order_by: Option<(String, SortOrder)>,
}

impl JqlBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn project(self, key: &str) -> Self {
    self.push(format!("project = {}", quote(key)))
  }

  pub fn assigned_to(self, user: &str) -> Self {
    self.push(format!("assignee = {}", quote(user)))
  }

  pub fn in_status<I, S>(self, statuses: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    self.push_list("status", "IN", statuses)
  }

  pub fn not_in_status<I, S>(self, statuses: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    self.push_list("status", "NOT IN", statuses)
  }

  pub fn with_priority<I, S>(self, priorities: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    self.push_list("priority", "IN", priorities)
  }

  pub fn in_sprint(self, name: &str) -> Self {
    self.push(format!("sprint = {}", quote(name)))
  }

  pub fn in_open_sprints(self) -> Self {
    self.push("sprint in openSprints()".to_string())
  }

  pub fn no_sprint(self) -> Self {
    self.push("sprint is EMPTY".to_string())
  }

  pub fn created_after(self, date: NaiveDate) -> Self {
    self.push(format!("created >= \"{}\"", date.format("%Y-%m-%d")))
  }

  /// One `labels = "x"` clause per label, all AND-joined.
  pub fn has_label<I, S>(mut self, labels: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    for label in labels {
      self = self.push(format!("labels = {}", quote(label.as_ref())));
    }
    self
  }

  pub fn unresolved(self) -> Self {
    self.push("resolution is EMPTY".to_string())
  }

  /// Match `text` in summary or description.
  pub fn text_search(self, text: &str) -> Self {
    let value = quote(text);
    self.push(format!("(summary ~ {} OR description ~ {})", value, value))
  }

  /// Set the sort. Only the last call is kept.
  pub fn order_by(mut self, field: &str, order: SortOrder) -> Self {
    self.order_by = Some((field.to_string(), order));
    self
  }

  pub fn is_empty(&self) -> bool {
    self.conditions.is_empty() && self.order_by.is_none()
  }

  /// Predicates joined by " AND ", then " ORDER BY <field> <dir>" if set.
  /// An empty builder yields an empty string.
  pub fn build(&self) -> String {
    let mut jql = self.conditions.join(" AND ");
    if let Some((field, order)) = &self.order_by {
      if !jql.is_empty() {
        jql.push(' ');
      }
      jql.push_str(&format!("ORDER BY {} {}", field, order.as_str()));
    }
    jql
  }

  fn push(mut self, condition: String) -> Self {
    self.conditions.push(condition);
    self
  }

  fn push_list<I, S>(self, field: &str, operator: &str, values: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let items: Vec<String> = values.into_iter().map(|v| quote(v.as_ref())).collect();
    if items.is_empty() {
      return self;
    }
    self.push(format!("{} {} ({})", field, operator, items.join(", ")))
  }
}

/// Escape backslashes, then double quotes.
pub fn escape(value: &str) -> String {
  value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn quote(value: &str) -> String {
  format!("\"{}\"", escape(value))
}
