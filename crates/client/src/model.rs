use serde::{Deserialize, Serialize};

/// Student profile supplied by the embedding host.
///
/// The widget reads it to build [`UserContext`] and never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub student_id: String,
    pub name: String,
    #[serde(rename = "dept")]
    pub department: String,
    pub cgpa: f64,
    #[serde(default)]
    pub skills: String,
    pub year: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrears_count: Option<u32>,
}

impl StudentProfile {
    pub fn new(
        student_id: impl Into<String>,
        name: impl Into<String>,
        department: impl Into<String>,
        cgpa: f64,
        skills: impl Into<String>,
        year: u32,
    ) -> Self {
        Self {
            student_id: student_id.into(),
            name: name.into(),
            department: department.into(),
            cgpa,
            skills: skills.into(),
            year,
            arrears_count: None,
        }
    }

    pub fn with_arrears(mut self, arrears_count: u32) -> Self {
        self.arrears_count = Some(arrears_count);
        self
    }

    /// Builds the outbound context object, defaulting missing arrears to zero.
    pub fn to_user_context(&self) -> UserContext {
        UserContext {
            student_id: self.student_id.clone(),
            name: self.name.clone(),
            department: self.department.clone(),
            cgpa: self.cgpa,
            skills: self.skills.clone(),
            year: self.year,
            arrears_count: self.arrears_count.unwrap_or(0),
        }
    }
}

impl Default for StudentProfile {
    fn default() -> Self {
        Self::new("CS2021001", "Rahul", "CSE", 7.5, "Python, Java", 3)
    }
}

/// Profile fields as the chat endpoint expects them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    pub student_id: String,
    pub name: String,
    pub department: String,
    pub cgpa: f64,
    pub skills: String,
    pub year: u32,
    pub arrears_count: u32,
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    /// Serialized as `null` until the backend has issued an identifier.
    pub session_id: Option<String>,
    pub user_context: UserContext,
}

impl ChatRequest {
    pub fn new(
        message: impl Into<String>,
        session_id: Option<String>,
        user_context: UserContext,
    ) -> Self {
        Self {
            message: message.into(),
            session_id,
            user_context,
        }
    }
}

/// Reply from `POST /api/chat`. Fields the widget does not use are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub suggested_actions: Vec<String>,
    #[serde(default)]
    pub sources: Option<Vec<String>>,
}

/// Reply from `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

/// One entry of a server-side transcript.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HistoryEntry {
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Reply from `GET /api/session/{id}/history`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionHistory {
    pub session_id: String,
    #[serde(default)]
    pub messages: Vec<HistoryEntry>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_arrears_defaults_to_zero_in_context() {
        let profile: StudentProfile = serde_json::from_str(
            r#"{"student_id":"CS2021001","name":"Rahul","dept":"CSE","cgpa":7.5,"skills":"Python, Java","year":3}"#,
        )
        .unwrap();

        let context = profile.to_user_context();
        assert_eq!(context.arrears_count, 0);
        assert_eq!(context.department, "CSE");

        let json = serde_json::to_value(&context).unwrap();
        assert_eq!(json["arrears_count"], 0);
        assert_eq!(json["department"], "CSE");
        assert_eq!(json["cgpa"], 7.5);
    }

    #[test]
    fn explicit_arrears_are_forwarded() {
        let context = StudentProfile::default().with_arrears(2).to_user_context();
        assert_eq!(context.arrears_count, 2);
    }

    #[test]
    fn first_request_serializes_null_session() {
        let request = ChatRequest::new("hello", None, StudentProfile::default().to_user_context());
        let json = serde_json::to_value(&request).unwrap();

        assert!(json["session_id"].is_null());
        assert_eq!(json["message"], "hello");
        assert_eq!(json["user_context"]["student_id"], "CS2021001");
    }

    #[test]
    fn response_tolerates_missing_and_null_optionals() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"response":"hi","session_id":"abc","suggested_actions":null,"timestamp":"2024-01-01T00:00:00"}"#,
        )
        .unwrap();

        assert_eq!(response.domain, None);
        assert!(response.suggested_actions.is_empty());
        assert_eq!(response.sources, None);
    }

    #[test]
    fn response_without_session_id_is_rejected() {
        let result = serde_json::from_str::<ChatResponse>(r#"{"response":"hi"}"#);
        assert!(result.is_err());
    }
}
