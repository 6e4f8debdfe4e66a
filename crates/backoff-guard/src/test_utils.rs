use serde_json::json;

use crate::admission_review::WorkloadUnit;

pub(crate) const REQUEST_UID: &str = "705ab4f5-6393-11e8-b7cc-42010a800002";

/// An AdmissionReview for the creation of a Pod owned by the `batch1` Job
pub(crate) fn build_admission_review() -> String {
    build_admission_review_for_resource("", "v1", "pods")
}

pub(crate) fn build_admission_review_for_resource(
    group: &str,
    version: &str,
    resource: &str,
) -> String {
    json!({
        "apiVersion": "admission.k8s.io/v1",
        "kind": "AdmissionReview",
        "request": {
            "uid": REQUEST_UID,
            "kind": {"group": "", "version": "v1", "kind": "Pod"},
            "resource": {"group": group, "version": version, "resource": resource},
            "requestKind": {"group": "", "version": "v1", "kind": "Pod"},
            "requestResource": {"group": "", "version": "v1", "resource": "pods"},
            "namespace": "default",
            "operation": "CREATE",
            "userInfo": {
                "username": "system:serviceaccount:kube-system:job-controller",
                "uid": "6a2c1b1e-0d9f-4b4a-a4b8-2f3e9d1c7a11",
                "groups": ["system:serviceaccounts", "system:serviceaccounts:kube-system", "system:authenticated"]
            },
            "object": {
                "apiVersion": "v1",
                "kind": "Pod",
                "metadata": {
                    "name": "batch1-x7k2p",
                    "generateName": "batch1-",
                    "namespace": "default",
                    "labels": {
                        "controller-uid": "0f7a5d2c-91a4-4c7e-b0a3-5de0a1b2c3d4",
                        "job-name": "batch1"
                    }
                },
                "spec": {
                    "restartPolicy": "Never",
                    "containers": [{"name": "pi", "image": "perl:5.34.0"}]
                }
            },
            "oldObject": null,
            "dryRun": false,
            "options": {"apiVersion": "meta.k8s.io/v1", "kind": "CreateOptions"}
        }
    })
    .to_string()
}

pub(crate) fn build_workload_unit(namespace: &str, job_name: Option<&str>) -> WorkloadUnit {
    let mut unit = WorkloadUnit {
        name: Some("candidate".to_owned()),
        namespace: namespace.to_owned(),
        ..Default::default()
    };
    unit.labels.insert("app".to_owned(), "pi".to_owned());
    if let Some(job_name) = job_name {
        unit.labels.insert("job-name".to_owned(), job_name.to_owned());
    }
    unit
}
