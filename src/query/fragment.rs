use super::{IdentitiesDb, sql_literal};
use crate::filters::{Dimension, DimensionFilter};
use crate::metrics::{DataSource, MetricError};

/// Extra tables and join conditions scoping a query to a dimension.
///
/// When the fragment comes from an all-items filter, `item_field` names the
/// expression to group by so that each row carries the item it belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    tables: Vec<String>,
    conditions: Vec<String>,
    item_field: Option<String>,
}

impl Fragment {
    fn new<const T: usize, const C: usize>(tables: [String; T], conditions: [String; C]) -> Self {
        Self {
            tables: tables.into(),
            conditions: conditions.into(),
            item_field: None,
        }
    }

    fn condition(mut self, condition: String) -> Self {
        self.conditions.push(condition);
        self
    }

    fn item(mut self, item_field: &str) -> Self {
        self.item_field = Some(item_field.to_string());
        self
    }

    #[must_use]
    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    #[must_use]
    pub fn conditions(&self) -> &[String] {
        &self.conditions
    }

    #[must_use]
    pub fn item_field(&self) -> Option<&str> {
        self.item_field.as_deref()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.conditions.is_empty()
    }
}

/// Columns of the row a data source counts, used to anchor identity joins.
struct Anchor {
    person: &'static str,
    date: &'static str,
}

const fn anchor(data_source: DataSource) -> Option<Anchor> {
    match data_source {
        DataSource::Scm => Some(Anchor {
            person: "s.author_id",
            date: "s.date",
        }),
        DataSource::Scr => Some(Anchor {
            person: "i.submitted_by",
            date: "i.submitted_on",
        }),
        DataSource::Releases | DataSource::Downloads => None,
    }
}

/// Whether `data_source` can be scoped by `dimension`.
#[must_use]
pub const fn supports(data_source: DataSource, dimension: Dimension) -> bool {
    match data_source {
        DataSource::Scm => true,
        DataSource::Scr => !matches!(dimension, Dimension::Domain),
        DataSource::Releases => matches!(dimension, Dimension::People),
        DataSource::Downloads => false,
    }
}

/// Build the fragment scoping `data_source` queries by `filter`.
///
/// No filter yields an empty fragment. Identity-backed dimensions need the identities
/// schema, and combinations the data source cannot express are rejected rather than
/// silently producing unscoped SQL.
pub fn fragment(
    data_source: DataSource,
    filter: Option<&DimensionFilter>,
    identities: Option<&IdentitiesDb>,
) -> Result<Fragment, MetricError> {
    let Some(filter) = filter else {
        return Ok(Fragment::default());
    };

    let dimension = filter.dimension();
    if !supports(data_source, dimension) {
        return Err(MetricError::UnsupportedDimension { data_source, dimension });
    }

    let ids = if dimension.needs_identities() {
        Some(identities.ok_or_else(|| {
            MetricError::Configuration(format!("the {dimension} filter of {data_source} requires an identities database"))
        })?)
    } else {
        None
    };

    let value = filter.value().map(sql_literal);

    if data_source == DataSource::Releases {
        let frag = Fragment::new(["releases r".to_string()], []);
        return Ok(match value {
            Some(value) => frag.condition(format!("r.author_id = {value}")),
            None => frag.item("r.author_id"),
        });
    }

    let Some(anchor) = anchor(data_source) else {
        return Err(MetricError::UnsupportedDimension { data_source, dimension });
    };

    let frag = match (dimension, ids) {
        (Dimension::Repository, _) => repository(data_source),
        (Dimension::People, _) => people_join(anchor.person),
        (Dimension::Company, Some(ids)) => company_join(ids, anchor.person, anchor.date),
        (Dimension::Country, Some(ids)) => country_join(ids, anchor.person),
        (Dimension::Domain, Some(ids)) => domain_join(ids, anchor.person),
        (Dimension::Project, Some(ids)) => return Ok(project(data_source, ids, value.as_deref())),
        (_, None) => return Err(MetricError::UnsupportedDimension { data_source, dimension }),
    };

    let item_field = match dimension {
        Dimension::Repository if data_source == DataSource::Scr => "t.url",
        Dimension::Repository => "r.name",
        Dimension::People => "pup.upeople_id",
        Dimension::Company => "com.name",
        Dimension::Country => "cn.name",
        Dimension::Domain => "dom.name",
        Dimension::Project => "pr.project_id",
    };

    Ok(match value {
        Some(value) => frag.condition(format!("{item_field} = {value}")),
        None => frag.item(item_field),
    })
}

/// FROM clause addition for `filter`, as `, table, table`.
pub fn from_fragment(
    data_source: DataSource,
    filter: &DimensionFilter,
    identities: Option<&IdentitiesDb>,
) -> Result<String, MetricError> {
    let frag = fragment(data_source, Some(filter), identities)?;
    Ok(frag.tables().iter().map(|table| format!(", {table}")).collect())
}

/// WHERE clause addition for `filter`, as ` AND condition AND condition`.
pub fn where_fragment(
    data_source: DataSource,
    filter: &DimensionFilter,
    identities: Option<&IdentitiesDb>,
) -> Result<String, MetricError> {
    let frag = fragment(data_source, Some(filter), identities)?;
    Ok(frag.conditions().iter().map(|condition| format!(" AND {condition}")).collect())
}

fn repository(data_source: DataSource) -> Fragment {
    if data_source == DataSource::Scr {
        Fragment::new(["trackers t".to_string()], ["t.id = i.tracker_id".to_string()])
    } else {
        Fragment::new(["repositories r".to_string()], ["r.id = s.repository_id".to_string()])
    }
}

/// Map the person column of a row to its unique identity.
pub(crate) fn people_join(person: &str) -> Fragment {
    Fragment::new(["people_upeople pup".to_string()], [format!("{person} = pup.people_id")])
}

/// Affiliation of the person behind a row, valid at the date of the row.
pub(crate) fn company_join(ids: &IdentitiesDb, person: &str, date: &str) -> Fragment {
    Fragment::new(
        [
            "people_upeople pup".to_string(),
            format!("{} upc", ids.table("upeople_companies")),
            format!("{} com", ids.table("companies")),
        ],
        [
            format!("{person} = pup.people_id"),
            "pup.upeople_id = upc.upeople_id".to_string(),
            format!("{date} >= upc.init"),
            format!("{date} < upc.end"),
            "upc.company_id = com.id".to_string(),
        ],
    )
}

pub(crate) fn country_join(ids: &IdentitiesDb, person: &str) -> Fragment {
    Fragment::new(
        [
            "people_upeople pup".to_string(),
            format!("{} upcn", ids.table("upeople_countries")),
            format!("{} cn", ids.table("countries")),
        ],
        [
            format!("{person} = pup.people_id"),
            "pup.upeople_id = upcn.upeople_id".to_string(),
            "upcn.country_id = cn.id".to_string(),
        ],
    )
}

pub(crate) fn domain_join(ids: &IdentitiesDb, person: &str) -> Fragment {
    Fragment::new(
        [
            "people_upeople pup".to_string(),
            format!("{} upd", ids.table("upeople_domains")),
            format!("{} dom", ids.table("domains")),
        ],
        [
            format!("{person} = pup.people_id"),
            "pup.upeople_id = upd.upeople_id".to_string(),
            "upd.domain_id = dom.id".to_string(),
        ],
    )
}

/// Repositories of a project, including the ones of all its subprojects.
fn project(data_source: DataSource, ids: &IdentitiesDb, project: Option<&str>) -> Fragment {
    let (table, join, name) = if data_source == DataSource::Scr {
        ("trackers t", "t.id = i.tracker_id", "t.url")
    } else {
        ("repositories r", "r.id = s.repository_id", "r.name")
    };
    let data_source = sql_literal(data_source.as_str());

    match project {
        Some(project) => Fragment::new(
            [table.to_string()],
            [
                join.to_string(),
                format!(
                    "{name} IN (WITH RECURSIVE subprojects(project_id) AS (SELECT {project} \
                     UNION SELECT pc.subproject_id FROM {} pc JOIN subprojects sp ON pc.project_id = sp.project_id) \
                     SELECT pr.repository_name FROM {} pr WHERE pr.data_source = {data_source} \
                     AND pr.project_id IN (SELECT project_id FROM subprojects))",
                    ids.table("project_children"),
                    ids.table("project_repositories"),
                ),
            ],
        ),
        None => Fragment::new(
            [table.to_string(), format!("{} pr", ids.table("project_repositories"))],
            [
                join.to_string(),
                format!("pr.repository_name = {name}"),
                format!("pr.data_source = {data_source}"),
            ],
        )
        .item("pr.project_id"),
    }
}
