use std::sync::Arc;

use axum::Router;
use backoff_guard::{
    api::{router, ApiServerState},
    cluster::ClusterClient,
};
use hyper::{http, Request, Response};
use kube::client::Body;
use serde_json::{json, Value};
use tower_test::mock::{Handle, SendResponse};

pub(crate) const REQUEST_UID: &str = "1299d386-525b-4032-98ae-1949f69f9cfc";

/// Build the router of the webhook, backed by a fake API server.
///
/// The fake API server knows about these Jobs, all of them inside of the
/// `default` namespace:
/// * `batch1`: `backoffLimit` 3, with 3 Pods
/// * `batch2`: doesn't exist, 2 Pods are labeled with its name
/// * `batch3`: `backoffLimit` 5, listing its Pods fails
pub(crate) fn app() -> Router {
    let (mocksvc, handle) = tower_test::mock::pair::<Request<Body>, Response<Body>>();
    api_server_scenario(handle);
    let kube_client = kube::Client::new(mocksvc, "default");

    let state = ApiServerState::new(ClusterClient::from_kube_client(kube_client));
    router(Arc::new(state))
}

fn api_server_scenario(handle: Handle<Request<Body>, Response<Body>>) {
    tokio::spawn(async move {
        let mut handle = handle;

        while let Some((request, send)) = handle.next_request().await {
            match (request.method(), request.uri().path()) {
                (&http::Method::GET, "/apis/batch/v1/namespaces/default/jobs/batch1") => {
                    send_response(send, http::StatusCode::OK, job("batch1", 3));
                }
                (&http::Method::GET, "/apis/batch/v1/namespaces/default/jobs/batch3") => {
                    send_response(send, http::StatusCode::OK, job("batch3", 5));
                }
                (&http::Method::GET, path) if path.starts_with("/apis/batch/v1/") => {
                    send_response(send, http::StatusCode::NOT_FOUND, not_found("jobs.batch"));
                }
                (&http::Method::GET, "/api/v1/namespaces/default/pods") => {
                    let query = request.uri().query().unwrap_or_default().to_owned();
                    if query.contains("job-name%3Dbatch1") {
                        send_response(send, http::StatusCode::OK, pod_list("batch1", 3));
                    } else if query.contains("job-name%3Dbatch2") {
                        send_response(send, http::StatusCode::OK, pod_list("batch2", 2));
                    } else if query.contains("job-name%3Dbatch3") {
                        send_response(
                            send,
                            http::StatusCode::INTERNAL_SERVER_ERROR,
                            internal_error(),
                        );
                    } else {
                        send_response(send, http::StatusCode::OK, pod_list("none", 0));
                    }
                }
                _ => {
                    panic!("unexpected request: {} {}", request.method(), request.uri());
                }
            }
        }
    });
}

fn send_response(send: SendResponse<Response<Body>>, status: http::StatusCode, response: Value) {
    let response = serde_json::to_vec(&response).unwrap();
    send.send_response(
        Response::builder()
            .status(status)
            .body(Body::from(response))
            .unwrap(),
    );
}

fn job(name: &str, backoff_limit: i32) -> Value {
    json!({
        "apiVersion": "batch/v1",
        "kind": "Job",
        "metadata": {"name": name, "namespace": "default"},
        "spec": {
            "backoffLimit": backoff_limit,
            "template": {
                "spec": {
                    "restartPolicy": "Never",
                    "containers": [{"name": "pi", "image": "perl:5.34.0"}]
                }
            }
        }
    })
}

fn pod_list(job_name: &str, count: usize) -> Value {
    let items: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "apiVersion": "v1",
                "kind": "Pod",
                "metadata": {
                    "name": format!("{job_name}-{i}"),
                    "namespace": "default",
                    "labels": {"job-name": job_name}
                }
            })
        })
        .collect();

    json!({
        "apiVersion": "v1",
        "kind": "PodList",
        "metadata": {"resourceVersion": "4242"},
        "items": items
    })
}

fn not_found(resource: &str) -> Value {
    json!({
        "apiVersion": "v1",
        "kind": "Status",
        "metadata": {},
        "status": "Failure",
        "message": format!("{resource} not found"),
        "reason": "NotFound",
        "code": 404
    })
}

fn internal_error() -> Value {
    json!({
        "apiVersion": "v1",
        "kind": "Status",
        "metadata": {},
        "status": "Failure",
        "message": "etcdserver: request timed out",
        "reason": "InternalError",
        "code": 500
    })
}

/// An AdmissionReview for the creation of a Pod. The Pod carries the
/// `job-name` label only when `job_name` is given.
pub(crate) fn admission_review(resource: &str, job_name: Option<&str>) -> String {
    let mut labels = json!({"app": "pi"});
    if let Some(job_name) = job_name {
        labels["job-name"] = json!(job_name);
    }

    json!({
        "apiVersion": "admission.k8s.io/v1",
        "kind": "AdmissionReview",
        "request": {
            "uid": REQUEST_UID,
            "kind": {"group": "", "version": "v1", "kind": "Pod"},
            "resource": {"group": "", "version": "v1", "resource": resource},
            "namespace": "default",
            "operation": "CREATE",
            "userInfo": {"username": "system:serviceaccount:kube-system:job-controller"},
            "object": {
                "apiVersion": "v1",
                "kind": "Pod",
                "metadata": {
                    "generateName": "pi-",
                    "labels": labels
                },
                "spec": {
                    "containers": [{"name": "pi", "image": "perl:5.34.0"}]
                }
            },
            "oldObject": {
                "apiVersion": "v1",
                "kind": "Pod",
                "metadata": {"name": "previous"}
            },
            "dryRun": false
        }
    })
    .to_string()
}
