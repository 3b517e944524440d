//! GraphQL documents sent to the GitHub API.

const FIELD_VALUES: &str = r"
    fieldValues(first: 30) {
      nodes {
        __typename
        ... on ProjectV2ItemFieldSingleSelectValue {
          optionId
          name
          field { ... on ProjectV2FieldCommon { name } }
        }
        ... on ProjectV2ItemFieldIterationValue {
          iterationId
          title
          field { ... on ProjectV2FieldCommon { name } }
        }
        ... on ProjectV2ItemFieldNumberValue {
          number
          field { ... on ProjectV2FieldCommon { name } }
        }
        ... on ProjectV2ItemFieldTextValue {
          text
          field { ... on ProjectV2FieldCommon { name } }
        }
      }
    }";

/// Issue or pull request by node id, with one page of its project items.
/// `$itemsCursor` continues the item list of an earlier response.
pub fn fetch_record() -> String {
    format!(
        r"query FetchRecord($id: ID!, $itemsCursor: String) {{
  node(id: $id) {{
    __typename
    ... on Issue {{
      id
      title
      url
      updatedAt
      author {{ login }}
      closedByPullRequestsReferences(first: 1, includeClosedPrs: false) {{ totalCount }}
      projectItems(first: 50, after: $itemsCursor) {{
        pageInfo {{ hasNextPage endCursor }}
        nodes {{ id project {{ id }} {FIELD_VALUES} }}
      }}
    }}
    ... on PullRequest {{
      id
      title
      url
      updatedAt
      author {{ login }}
      projectItems(first: 50, after: $itemsCursor) {{
        pageInfo {{ hasNextPage endCursor }}
        nodes {{ id project {{ id }} {FIELD_VALUES} }}
      }}
    }}
  }}
}}"
    )
}

/// One page of open issue ids.
pub const OPEN_ISSUES: &str = r"query OpenIssues($owner: String!, $repo: String!, $cursor: String) {
  repository(owner: $owner, name: $repo) {
    issues(first: 100, after: $cursor, states: OPEN) {
      pageInfo { hasNextPage endCursor }
      nodes { id }
    }
  }
}";

/// One page of open pull request ids.
pub const OPEN_PULL_REQUESTS: &str = r"query OpenPullRequests($owner: String!, $repo: String!, $cursor: String) {
  repository(owner: $owner, name: $repo) {
    pullRequests(first: 100, after: $cursor, states: OPEN) {
      pageInfo { hasNextPage endCursor }
      nodes { id }
    }
  }
}";

/// Add a record to a project; returns the existing item if already there.
pub const ADD_ITEM: &str = r"mutation AddItem($project: ID!, $content: ID!) {
  addProjectV2ItemById(input: { projectId: $project, contentId: $content }) {
    item { id }
  }
}";

/// Delete a project item.
pub const DELETE_ITEM: &str = r"mutation DeleteItem($project: ID!, $item: ID!) {
  deleteProjectV2Item(input: { projectId: $project, itemId: $item }) {
    deletedItemId
  }
}";

/// Write one field value.
pub const UPDATE_FIELD: &str = r"mutation UpdateField($project: ID!, $item: ID!, $field: ID!, $value: ProjectV2FieldValue!) {
  updateProjectV2ItemFieldValue(
    input: { projectId: $project, itemId: $item, fieldId: $field, value: $value }
  ) {
    projectV2Item { id }
  }
}";

/// Clear one field value.
pub const CLEAR_FIELD: &str = r"mutation ClearField($project: ID!, $item: ID!, $field: ID!) {
  clearProjectV2ItemFieldValue(
    input: { projectId: $project, itemId: $item, fieldId: $field }
  ) {
    projectV2Item { id }
  }
}";

const PROJECT_FIELDS: &str = r"
    projectV2(number: $number) {
      id
      fields(first: 50) {
        nodes {
          __typename
          ... on ProjectV2Field { id name dataType }
          ... on ProjectV2SingleSelectField { id name options { id name } }
          ... on ProjectV2IterationField {
            id
            name
            configuration {
              iterations { id title startDate duration }
              completedIterations { id title startDate duration }
            }
          }
        }
      }
    }";

/// Field definitions of a project owned by an organization.
pub fn organization_project() -> String {
    format!(
        r"query OrganizationProject($owner: String!, $number: Int!) {{
  organization(login: $owner) {{ {PROJECT_FIELDS} }}
}}"
    )
}

/// Field definitions of a project owned by a user.
pub fn user_project() -> String {
    format!(
        r"query UserProject($owner: String!, $number: Int!) {{
  user(login: $owner) {{ {PROJECT_FIELDS} }}
}}"
    )
}
