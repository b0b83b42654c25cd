//! The three fixed operations issued against the data service, with typed
//! decoding of the GraphQL envelope in place of ad-hoc map digging.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;

use crate::data::client::{DataServiceClient, DataServiceError};

const USER_BY_EMAIL: &str = r#"
query UserByEmail($email: String!) {
    users(where: {email: {_eq: $email}}, limit: 1) {
        id
        email
        password
    }
}
"#;

const CREATE_USER: &str = r#"
mutation CreateUser($username: String!, $email: String!, $password: String!) {
    insert_users_one(object: {username: $username, email: $email, password: $password}) {
        id
        username
        email
        password
    }
}
"#;

const UPDATE_PASSWORD: &str = r#"
mutation UpdatePassword($id: Int!, $password: String!) {
    update_users_by_pk(pk_columns: {id: $id}, _set: {password: $password}) {
        id
    }
}
"#;

/// User record as stored by the data service. `password` holds the digest.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredUser {
    pub id: i64,
    pub email: String,
    pub password: String,
}

/// Row returned by the create-user mutation; echoed back to the client on
/// signup, digest included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphqlErrorEntry>>,
}

#[derive(Deserialize)]
struct GraphqlErrorEntry {
    message: String,
}

#[derive(Debug, Deserialize)]
struct UsersData {
    users: Vec<StoredUser>,
}

#[derive(Deserialize)]
struct CreateUserData {
    insert_users_one: CreatedUser,
}

#[derive(Deserialize)]
struct UpdatePasswordData {
    update_users_by_pk: Option<UpdatedRow>,
}

#[derive(Deserialize)]
struct UpdatedRow {
    #[allow(dead_code)]
    id: i64,
}

fn decode<T: DeserializeOwned>(raw: &[u8]) -> Result<T, DataServiceError> {
    let envelope: GraphqlResponse<T> = serde_json::from_slice(raw)?;
    if let Some(errors) = envelope.errors {
        if !errors.is_empty() {
            let messages = errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(DataServiceError::Graphql(messages));
        }
    }
    envelope.data.ok_or(DataServiceError::MissingData)
}

impl DataServiceClient {
    /// Point lookup by email. `None` when no user matches.
    pub async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<StoredUser>, DataServiceError> {
        let raw = self.execute(USER_BY_EMAIL, json!({ "email": email })).await?;
        let data: UsersData = decode(&raw)?;
        Ok(data.users.into_iter().next())
    }

    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<CreatedUser, DataServiceError> {
        let raw = self
            .execute(
                CREATE_USER,
                json!({ "username": username, "email": email, "password": password_hash }),
            )
            .await?;
        let data: CreateUserData = decode(&raw)?;
        Ok(data.insert_users_one)
    }

    pub async fn update_password(
        &self,
        id: i64,
        password_hash: &str,
    ) -> Result<(), DataServiceError> {
        let raw = self
            .execute(UPDATE_PASSWORD, json!({ "id": id, "password": password_hash }))
            .await?;
        let data: UpdatePasswordData = decode(&raw)?;
        // A null row means the primary key no longer exists.
        data.update_users_by_pk
            .map(|_| ())
            .ok_or(DataServiceError::MissingData)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_user_lookup_with_match() {
        let raw = br#"{"data":{"users":[{"id":7,"email":"a@x.com","password":"$argon2id$..."}]}}"#;
        let data: UsersData = decode(raw).expect("decode should succeed");
        assert_eq!(data.users.len(), 1);
        assert_eq!(data.users[0].id, 7);
    }

    #[test]
    fn decode_user_lookup_with_empty_result() {
        let raw = br#"{"data":{"users":[]}}"#;
        let data: UsersData = decode(raw).expect("decode should succeed");
        assert!(data.users.is_empty());
    }

    #[test]
    fn decode_rejects_missing_password_field() {
        let raw = br#"{"data":{"users":[{"id":7,"email":"a@x.com"}]}}"#;
        let err = decode::<UsersData>(raw).unwrap_err();
        assert!(matches!(err, DataServiceError::Decode(_)));
    }

    #[test]
    fn decode_surfaces_graphql_errors() {
        let raw = br#"{"errors":[{"message":"field 'users' not found"}]}"#;
        let err = decode::<UsersData>(raw).unwrap_err();
        match err {
            DataServiceError::Graphql(msg) => assert!(msg.contains("not found")),
            other => panic!("expected Graphql error, got {other:?}"),
        }
    }

    #[test]
    fn decode_rejects_envelope_without_data() {
        let raw = br#"{}"#;
        let err = decode::<UsersData>(raw).unwrap_err();
        assert!(matches!(err, DataServiceError::MissingData));
    }

    #[test]
    fn decode_rejects_non_json_body() {
        let raw = b"upstream exploded";
        let err = decode::<UsersData>(raw).unwrap_err();
        assert!(matches!(err, DataServiceError::Decode(_)));
    }
}
