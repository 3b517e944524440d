//! Resolve a [`ProjectLayout`] from the project's field definitions.

use chrono::{NaiveDate, Utc};
use serde_json::json;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    FieldIds, ProjectConfig, ProjectField, ProjectLayout, StatusNames, StatusOptions,
};

use super::client::GitHubClient;
use super::models::{
    IterationNode, ProjectFieldNode, ProjectNode, ProjectOwnerData, SelectOption,
};
use super::queries;

/// Resolve the layout described by `config`.
///
/// Complete overrides are used as-is without a network call. Otherwise the
/// project is looked up by owner and number (organization first, then
/// user) and any overrides are applied on top.
pub async fn resolve_layout(
    client: &GitHubClient,
    config: &ProjectConfig,
) -> DomainResult<ProjectLayout> {
    if let Some(layout) = config.overrides.to_layout() {
        tracing::debug!("using project layout from configuration");
        layout.validate()?;
        return Ok(layout);
    }

    let (Some(owner), Some(number)) = (config.owner.as_deref(), config.number) else {
        return Err(DomainError::ValidationFailed(
            "project.owner and project.number are required unless every project.overrides id is set"
                .to_string(),
        ));
    };

    let project = fetch_project(client, owner, number).await?;
    let resolved = build_layout(
        project,
        &config.status_names,
        config.stale_option_name.as_deref(),
        Utc::now().date_naive(),
    )?;
    let layout = config.overrides.apply(resolved);
    layout.validate()?;

    tracing::info!(
        project_id = %layout.project_id,
        current_cycle = %layout.current_cycle_id,
        "resolved project layout"
    );
    Ok(layout)
}

async fn fetch_project(client: &GitHubClient, owner: &str, number: u64) -> DomainResult<ProjectNode> {
    let variables = json!({ "owner": owner, "number": number });

    let org: DomainResult<ProjectOwnerData> = client
        .graphql("organization_project", &queries::organization_project(), variables.clone())
        .await;
    let data = match org {
        Ok(data) if data.organization.is_some() => data,
        Ok(_) | Err(DomainError::RecordNotFound(_)) => {
            tracing::debug!(owner, "no organization project, trying user");
            client
                .graphql("user_project", &queries::user_project(), variables)
                .await?
        }
        Err(err) => return Err(err),
    };

    data.organization
        .and_then(|owner| owner.project_v2)
        .ok_or_else(|| DomainError::RecordNotFound(format!("project {owner}/{number}")))
}

/// Pick the ids the reconciliation core needs out of a project's fields.
///
/// The current cycle is the iteration whose window contains `today`.
pub(crate) fn build_layout(
    project: ProjectNode,
    names: &StatusNames,
    stale_option_name: Option<&str>,
    today: NaiveDate,
) -> DomainResult<ProjectLayout> {
    let mut status: Option<(String, Vec<SelectOption>)> = None;
    let mut stale: Option<(String, Vec<SelectOption>)> = None;
    let mut cycle: Option<(String, Vec<IterationNode>)> = None;
    let mut rollovers: Option<String> = None;

    for field in project.fields.nodes {
        match field {
            ProjectFieldNode::SingleSelect { id, name, options } => {
                if name == ProjectField::Status.name() {
                    status = Some((id, options));
                } else if name == ProjectField::Stale.name() {
                    stale = Some((id, options));
                }
            }
            ProjectFieldNode::Iteration {
                id,
                name,
                configuration,
            } if name == ProjectField::Cycle.name() => {
                let mut iterations = configuration.iterations;
                iterations.extend(configuration.completed_iterations);
                cycle = Some((id, iterations));
            }
            ProjectFieldNode::Plain { id, name, .. } if name == ProjectField::Rollovers.name() => {
                rollovers = Some(id);
            }
            _ => {}
        }
    }

    let (status_field, status_options) = status.ok_or_else(|| missing_field(ProjectField::Status))?;
    let (stale_field, stale_options) = stale.ok_or_else(|| missing_field(ProjectField::Stale))?;
    let (cycle_field, iterations) = cycle.ok_or_else(|| missing_field(ProjectField::Cycle))?;
    let rollovers_field = rollovers.ok_or_else(|| missing_field(ProjectField::Rollovers))?;

    let current = iterations
        .iter()
        .find(|it| it.contains(today))
        .ok_or_else(|| {
            DomainError::ValidationFailed(format!("no cycle covers {today}"))
        })?;
    tracing::debug!(cycle = %current.title, start = %current.start_date, "current cycle");

    let stale_option = match stale_option_name {
        Some(name) => find_option(&stale_options, name)?,
        None => stale_options
            .first()
            .map(|o| o.id.clone())
            .ok_or_else(|| DomainError::ValidationFailed("Stale field has no options".to_string()))?,
    };

    Ok(ProjectLayout {
        project_id: project.id,
        fields: FieldIds {
            status: status_field,
            cycle: cycle_field,
            stale: stale_field,
            rollovers: rollovers_field,
        },
        statuses: StatusOptions {
            triage: find_option(&status_options, &names.triage)?,
            backlog: find_option(&status_options, &names.backlog)?,
            todo: find_option(&status_options, &names.todo)?,
            in_progress: find_option(&status_options, &names.in_progress)?,
        },
        current_cycle_id: current.id.clone(),
        stale_option_id: stale_option,
    })
}

fn missing_field(field: ProjectField) -> DomainError {
    DomainError::ValidationFailed(format!("project has no usable `{field}` field"))
}

fn find_option(options: &[SelectOption], name: &str) -> DomainResult<String> {
    options
        .iter()
        .find(|o| o.name.eq_ignore_ascii_case(name))
        .map(|o| o.id.clone())
        .ok_or_else(|| DomainError::ValidationFailed(format!("no option named `{name}`")))
}
