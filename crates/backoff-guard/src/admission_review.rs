use std::{collections::BTreeMap, fmt};

use k8s_openapi::apimachinery::pkg::{apis::meta::v1::ObjectMeta, runtime::RawExtension};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("cannot decode admission review: {0}")]
    Review(#[source] serde_json::Error),

    #[error("admission review does not contain a request")]
    MissingRequest,

    #[error("expect resource to be {expected}")]
    ResourceMismatch {
        expected: GroupVersionResource,
        found: GroupVersionResource,
    },

    #[error("admission request does not contain an object")]
    MissingObject,

    #[error("cannot decode embedded object: {0}")]
    Object(#[source] serde_json::Error),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GroupVersionKind {
    pub group: String,
    pub version: String,
    pub kind: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GroupVersionResource {
    pub group: String,
    pub version: String,
    pub resource: String,
}

impl GroupVersionResource {
    /// The only resource this webhook knows how to evaluate: `v1/pods`
    pub fn pods() -> Self {
        GroupVersionResource {
            group: String::new(),
            version: String::from("v1"),
            resource: String::from("pods"),
        }
    }
}

impl fmt::Display for GroupVersionResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}, Resource={}",
            self.group, self.version, self.resource
        )
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReview {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<AdmissionRequest>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<AdmissionResponse>,
}

impl AdmissionReview {
    pub fn new_with_response(response: AdmissionResponse) -> Self {
        AdmissionReview {
            response: Some(response),
            ..Default::default()
        }
    }
}

impl Default for AdmissionReview {
    fn default() -> Self {
        AdmissionReview {
            api_version: Some(String::from("admission.k8s.io/v1")),
            kind: Some(String::from("AdmissionReview")),
            request: None,
            response: None,
        }
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionRequest {
    pub uid: String,
    pub kind: GroupVersionKind,
    pub resource: GroupVersionResource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_resource: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub operation: String,
    #[serde(default)]
    pub user_info: k8s_openapi::api::authentication::v1::UserInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<RawExtension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_object: Option<RawExtension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<RawExtension>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AdmissionResponseStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AdmissionResponse {
    pub uid: String,
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AdmissionResponseStatus>,
}

impl AdmissionResponse {
    pub fn allow(uid: String) -> Self {
        AdmissionResponse {
            uid,
            allowed: true,
            status: None,
        }
    }

    pub fn reject(uid: String, message: String) -> Self {
        AdmissionResponse {
            uid,
            allowed: false,
            status: Some(AdmissionResponseStatus {
                message: Some(message),
                code: None,
            }),
        }
    }

    /// Build a response that reports a failure that happened while handling
    /// the request. `allowed` is left to `false`.
    pub fn from_error(uid: String, error: &dyn std::error::Error, code: Option<u16>) -> Self {
        AdmissionResponse {
            uid,
            allowed: false,
            status: Some(AdmissionResponseStatus {
                message: Some(error.to_string()),
                code,
            }),
        }
    }
}

/// The Pod being admitted, reduced to what the policy looks at
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkloadUnit {
    pub name: Option<String>,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
}

#[derive(serde::Deserialize)]
struct EmbeddedObject {
    #[serde(default)]
    metadata: ObjectMeta,
}

/// Decode the body of an incoming request and return the `AdmissionRequest`
/// carried by the envelope.
pub fn decode_review(raw: &[u8]) -> Result<AdmissionRequest, DecodeError> {
    let review: AdmissionReview = serde_json::from_slice(raw).map_err(DecodeError::Review)?;
    review.request.ok_or(DecodeError::MissingRequest)
}

/// Ensure the request targets Pods before anything else is looked at
pub fn check_resource(request: &AdmissionRequest) -> Result<(), DecodeError> {
    let expected = GroupVersionResource::pods();
    if request.resource != expected {
        return Err(DecodeError::ResourceMismatch {
            expected,
            found: request.resource.clone(),
        });
    }
    Ok(())
}

/// Decode the object embedded inside of the request.
///
/// Pods created through `generateName` by the Job controller may not have
/// their namespace set yet, in that case the namespace of the request is used.
pub fn decode_unit(request: &AdmissionRequest) -> Result<WorkloadUnit, DecodeError> {
    let raw = request.object.as_ref().ok_or(DecodeError::MissingObject)?;
    let object: EmbeddedObject =
        serde_json::from_value(raw.0.clone()).map_err(DecodeError::Object)?;

    let namespace = object
        .metadata
        .namespace
        .filter(|ns| !ns.is_empty())
        .or_else(|| request.namespace.clone())
        .unwrap_or_default();

    Ok(WorkloadUnit {
        name: object.metadata.name,
        namespace,
        labels: object.metadata.labels.unwrap_or_default(),
    })
}

/// Serialize the outgoing envelope. The object and the old object of the
/// request are always dropped.
pub fn encode_review(mut review: AdmissionReview) -> serde_json::Result<Vec<u8>> {
    if let Some(request) = review.request.as_mut() {
        request.object = None;
        request.old_object = None;
    }
    serde_json::to_vec(&review)
}
