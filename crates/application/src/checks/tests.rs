use std::time::Duration;

use chrono::Utc;
use clouddoctor_domain::{
    ALL_USERS_GROUP_URI, AccessKey, AccountSummary, AclGrant, AclGrantee, AttachedPolicy,
    BucketAcl, CheckStatus, CreateVolumePermission, EncryptionConfiguration, EncryptionRule,
    IamUser, Instance, InstanceMetadataOptions, LaunchPermission, MachineImage, NO_RESOURCE,
    ReplicationConfiguration, ReplicationRule, Snapshot,
};
use serde_json::json;

use super::{
    AclAccessDeniedPolicy, Check, CheckSettings, EbsSnapshotPrivateCheck, Ec2AmiPrivateCheck,
    Ec2Imdsv2Check, Ec2PublicIpCheck, IamAccessKeyAgeCheck, IamRootAccessKeyCheck,
    IamRootMfaCheck, S3BucketPolicyCheck, S3EncryptionCheck, S3PublicAccessCheck,
    S3ReplicationRoleCheck,
};
use crate::test_fakes::{FakeCloud, service_error};

fn encrypted() -> EncryptionConfiguration {
    EncryptionConfiguration {
        rules: vec![EncryptionRule {
            sse_algorithm: "AES256".to_owned(),
            kms_master_key_id: None,
            bucket_key_enabled: None,
        }],
    }
}

fn replication_to(destination: Option<&str>) -> ReplicationConfiguration {
    ReplicationConfiguration {
        role: Some("arn:aws:iam::123456789012:role/replication-role".to_owned()),
        rules: vec![ReplicationRule {
            id: Some("rule-1".to_owned()),
            status: Some("Enabled".to_owned()),
            destination_bucket: destination.map(str::to_owned),
        }],
    }
}

fn replicate_policy(resource: &str) -> serde_json::Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Effect": "Allow",
            "Action": ["s3:ReplicateObject", "s3:ReplicateDelete"],
            "Resource": [resource]
        }]
    })
}

#[tokio::test]
async fn public_get_object_policy_fails_with_offending_statement() {
    let mut cloud = FakeCloud::with_buckets(&["public-bucket"]);
    cloud.policies.insert(
        "public-bucket".to_owned(),
        Ok(r#"{"Statement":[{"Effect":"Allow","Principal":"*","Action":"s3:GetObject","Resource":"arn:aws:s3:::public-bucket/*"}]}"#.to_owned()),
    );

    let outcome = S3BucketPolicyCheck::new(CheckSettings::default())
        .run(&cloud.client())
        .await;

    assert_eq!(outcome.check_id, "s3_bucket_policy");
    assert_eq!(outcome.guideline_id, 8);
    assert_eq!(outcome.results.len(), 1);
    let result = &outcome.results[0];
    assert_eq!(result.status, CheckStatus::Fail);
    assert_eq!(result.resource_id, "public-bucket");
    assert_eq!(
        result.details["vulnerable_statements"][0]["Action"],
        json!("s3:GetObject")
    );
    assert!(outcome.evidence[0].documents["policy"].is_object());
}

#[tokio::test]
async fn bucket_policy_absent_or_private_passes() {
    let mut cloud = FakeCloud::with_buckets(&["no-policy", "scoped"]);
    cloud.policies.insert(
        "scoped".to_owned(),
        Ok(json!({
            "Statement": [{
                "Effect": "Allow",
                "Principal": {"AWS": "arn:aws:iam::123456789012:root"},
                "Action": "s3:GetObject",
                "Resource": "arn:aws:s3:::scoped/*"
            }]
        })
        .to_string()),
    );

    let outcome = S3BucketPolicyCheck::new(CheckSettings::default())
        .run(&cloud.client())
        .await;

    assert_eq!(outcome.count(CheckStatus::Pass), 2);
    assert_eq!(outcome.results[0].details["policy"], json!(null));
    assert!(outcome.evidence[1].documents["policy"].is_object());
}

#[tokio::test]
async fn malformed_bucket_policy_is_an_error_for_that_bucket() {
    let mut cloud = FakeCloud::with_buckets(&["broken"]);
    cloud
        .policies
        .insert("broken".to_owned(), Ok("{not json".to_owned()));

    let outcome = S3BucketPolicyCheck::new(CheckSettings::default())
        .run(&cloud.client())
        .await;

    assert_eq!(outcome.results[0].status, CheckStatus::Error);
    assert_eq!(
        outcome.evidence[0].documents["policy"],
        json!("{not json")
    );
}

#[tokio::test]
async fn empty_account_yields_single_resourceless_pass() {
    let settings = CheckSettings::default();
    let checks: Vec<Box<dyn Check>> = vec![
        Box::new(S3BucketPolicyCheck::new(settings)),
        Box::new(S3PublicAccessCheck::new(settings)),
        Box::new(S3EncryptionCheck::new(settings)),
        Box::new(S3ReplicationRoleCheck::new(settings)),
        Box::new(Ec2Imdsv2Check::new(settings)),
        Box::new(EbsSnapshotPrivateCheck::new(settings)),
        Box::new(IamAccessKeyAgeCheck::new(settings)),
        Box::new(Ec2PublicIpCheck::new(settings)),
        Box::new(Ec2AmiPrivateCheck::new(settings)),
    ];
    let client = FakeCloud::default().client();

    for check in checks {
        let outcome = check.run(&client).await;
        assert_eq!(outcome.results.len(), 1, "{}", check.id());
        assert_eq!(outcome.results[0].status, CheckStatus::Pass);
        assert_eq!(outcome.results[0].resource_id, NO_RESOURCE);
        assert!(outcome.evidence.is_empty());
    }
}

#[tokio::test]
async fn enumeration_failure_yields_single_resourceless_error() {
    let cloud = FakeCloud {
        bucket_listing_error: Some(service_error("InternalError")),
        ..FakeCloud::default()
    };

    let outcome = S3EncryptionCheck::new(CheckSettings::default())
        .run(&cloud.client())
        .await;

    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].status, CheckStatus::Error);
    assert!(outcome.results[0].is_resourceless());
    assert!(outcome.results[0].message.contains("InternalError"));
}

#[tokio::test]
async fn one_failing_bucket_does_not_hide_the_others() {
    let names = ["alpha", "bravo", "charlie", "delta", "echo"];
    let mut cloud = FakeCloud::with_buckets(&names);
    for name in ["alpha", "bravo", "delta", "echo"] {
        cloud.encryptions.insert(name.to_owned(), Ok(encrypted()));
    }
    cloud
        .encryptions
        .insert("charlie".to_owned(), Err(service_error("SlowDown")));

    let settings = CheckSettings {
        resource_parallelism: 2,
        ..CheckSettings::default()
    };
    let outcome = S3EncryptionCheck::new(settings).run(&cloud.client()).await;

    let resources: Vec<_> = outcome
        .results
        .iter()
        .map(|result| result.resource_id.as_str())
        .collect();
    assert_eq!(resources, names);
    assert_eq!(outcome.count(CheckStatus::Pass), 4);
    assert_eq!(outcome.results[2].status, CheckStatus::Error);

    let evidence: Vec<_> = outcome
        .evidence
        .iter()
        .map(|record| record.resource_id.as_str())
        .collect();
    assert_eq!(evidence, names);
}

#[tokio::test(start_paused = true)]
async fn slow_early_buckets_still_report_in_enumeration_order() {
    let names = ["alpha", "bravo", "charlie", "delta", "echo"];
    let mut cloud = FakeCloud::with_buckets(&names);
    for (index, name) in names.iter().enumerate() {
        cloud.encryptions.insert((*name).to_owned(), Ok(encrypted()));
        let latency_ms = 100 * (names.len() - index) as u64;
        cloud
            .encryption_latency
            .insert((*name).to_owned(), Duration::from_millis(latency_ms));
    }

    let settings = CheckSettings {
        resource_parallelism: names.len(),
        ..CheckSettings::default()
    };
    let outcome = S3EncryptionCheck::new(settings).run(&cloud.client()).await;

    let resources: Vec<_> = outcome
        .results
        .iter()
        .map(|result| result.resource_id.as_str())
        .collect();
    assert_eq!(resources, names);
    let evidence: Vec<_> = outcome
        .evidence
        .iter()
        .map(|record| record.resource_id.as_str())
        .collect();
    assert_eq!(evidence, names);
}

#[tokio::test]
async fn missing_bucket_during_lookup_is_an_error_for_every_storage_check() {
    let mut cloud = FakeCloud::with_buckets(&["gone"]);
    cloud
        .policies
        .insert("gone".to_owned(), Err(service_error("NoSuchBucket")));
    cloud
        .acls
        .insert("gone".to_owned(), Err(service_error("NoSuchBucket")));
    cloud
        .encryptions
        .insert("gone".to_owned(), Err(service_error("NoSuchBucket")));
    cloud
        .replications
        .insert("gone".to_owned(), Err(service_error("NoSuchBucket")));
    let client = cloud.client();
    let settings = CheckSettings::default();
    let checks: Vec<Box<dyn Check>> = vec![
        Box::new(S3BucketPolicyCheck::new(settings)),
        Box::new(S3PublicAccessCheck::new(settings)),
        Box::new(S3EncryptionCheck::new(settings)),
        Box::new(S3ReplicationRoleCheck::new(settings)),
    ];

    for check in checks {
        let outcome = check.run(&client).await;
        assert_eq!(outcome.results[0].status, CheckStatus::Error, "{}", check.id());
        assert!(outcome.results[0].message.contains("NoSuchBucket"));
    }
}

#[tokio::test]
async fn another_calls_absence_code_is_not_treated_as_absence() {
    let mut cloud = FakeCloud::with_buckets(&["mixed"]);
    cloud.encryptions.insert(
        "mixed".to_owned(),
        Err(service_error("NoSuchBucketPolicy")),
    );

    let outcome = S3EncryptionCheck::new(CheckSettings::default())
        .run(&cloud.client())
        .await;

    assert_eq!(outcome.results[0].status, CheckStatus::Error);
}

#[tokio::test]
async fn missing_encryption_fails() {
    let cloud = FakeCloud::with_buckets(&["plain"]);

    let outcome = S3EncryptionCheck::new(CheckSettings::default())
        .run(&cloud.client())
        .await;

    assert_eq!(outcome.results[0].status, CheckStatus::Fail);
    assert_eq!(
        outcome.results[0].message,
        "bucket plain has no default encryption configured"
    );
}

#[tokio::test]
async fn repeated_runs_against_unchanged_state_agree() {
    let mut cloud = FakeCloud::with_buckets(&["a", "b"]);
    cloud.encryptions.insert("a".to_owned(), Ok(encrypted()));
    let client = cloud.client();
    let check = S3EncryptionCheck::new(CheckSettings::default());

    let first = check.run(&client).await;
    let second = check.run(&client).await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn public_acl_grant_fails_with_permissions() {
    let mut cloud = FakeCloud::with_buckets(&["open"]);
    cloud.acls.insert(
        "open".to_owned(),
        Ok(BucketAcl {
            owner: Some("owner".to_owned()),
            grants: vec![AclGrant {
                grantee: AclGrantee {
                    kind: "Group".to_owned(),
                    uri: Some(ALL_USERS_GROUP_URI.to_owned()),
                    id: None,
                    display_name: None,
                },
                permission: "FULL_CONTROL".to_owned(),
            }],
        }),
    );

    let outcome = S3PublicAccessCheck::new(CheckSettings::default())
        .run(&cloud.client())
        .await;

    let result = &outcome.results[0];
    assert_eq!(result.status, CheckStatus::Fail);
    assert_eq!(
        result.details["public_grants"],
        json!(["READ", "READ_ACP", "WRITE", "WRITE_ACP"])
    );
}

#[tokio::test]
async fn denied_acl_read_follows_configured_policy() {
    let expectations = [
        (AclAccessDeniedPolicy::AssumeNotPublic, CheckStatus::Pass),
        (AclAccessDeniedPolicy::Warn, CheckStatus::Warn),
        (AclAccessDeniedPolicy::Error, CheckStatus::Error),
    ];

    for (policy, expected) in expectations {
        let mut cloud = FakeCloud::with_buckets(&["locked"]);
        cloud
            .acls
            .insert("locked".to_owned(), Err(service_error("AccessDenied")));
        let settings = CheckSettings {
            acl_access_denied: policy,
            ..CheckSettings::default()
        };

        let outcome = S3PublicAccessCheck::new(settings)
            .run(&cloud.client())
            .await;

        assert_eq!(outcome.results[0].status, expected, "{}", policy.as_str());
    }
}

#[tokio::test]
async fn other_acl_failures_are_errors() {
    let mut cloud = FakeCloud::with_buckets(&["flaky"]);
    cloud
        .acls
        .insert("flaky".to_owned(), Err(service_error("InternalError")));

    let outcome = S3PublicAccessCheck::new(CheckSettings::default())
        .run(&cloud.client())
        .await;

    assert_eq!(outcome.results[0].status, CheckStatus::Error);
}

#[tokio::test]
async fn replication_role_scoped_to_destination_passes() {
    let mut cloud = FakeCloud::with_buckets(&["source"]);
    cloud.replications.insert(
        "source".to_owned(),
        Ok(replication_to(Some("arn:aws:s3:::dest-bucket"))),
    );
    cloud.inline_policies.insert(
        "replication-role".to_owned(),
        vec![(
            "replicate".to_owned(),
            replicate_policy("arn:aws:s3:::dest-bucket/*"),
        )],
    );

    let outcome = S3ReplicationRoleCheck::new(CheckSettings::default())
        .run(&cloud.client())
        .await;

    assert_eq!(outcome.results[0].status, CheckStatus::Pass);
    let scanned = &outcome.evidence[0].documents["scanned_iam_policies"];
    assert_eq!(scanned[0]["name"], json!("replicate"));
    assert_eq!(scanned[0]["type"], json!("inline"));
}

#[tokio::test]
async fn replication_role_with_wildcard_resource_fails() {
    let mut cloud = FakeCloud::with_buckets(&["source"]);
    cloud.replications.insert(
        "source".to_owned(),
        Ok(replication_to(Some("arn:aws:s3:::dest-bucket"))),
    );
    cloud.attached_policies.insert(
        "replication-role".to_owned(),
        vec![AttachedPolicy {
            policy_name: "broad".to_owned(),
            policy_arn: "arn:aws:iam::123456789012:policy/broad".to_owned(),
        }],
    );
    cloud.managed_policies.insert(
        "arn:aws:iam::123456789012:policy/broad".to_owned(),
        replicate_policy("*"),
    );

    let outcome = S3ReplicationRoleCheck::new(CheckSettings::default())
        .run(&cloud.client())
        .await;

    let result = &outcome.results[0];
    assert_eq!(result.status, CheckStatus::Fail);
    assert_eq!(
        result.details["unrestricted_destinations"],
        json!(["arn:aws:s3:::dest-bucket"])
    );
    assert_eq!(
        result.details["scanned_iam_policies"][0]["type"],
        json!("attached")
    );
}

#[tokio::test]
async fn unparseable_role_policy_is_an_error_unless_another_policy_scopes() {
    let missing_effect = json!({
        "Statement": [{
            "Action": "s3:ReplicateObject",
            "Resource": "arn:aws:s3:::dest-bucket/*"
        }]
    });

    let mut cloud = FakeCloud::with_buckets(&["source"]);
    cloud.replications.insert(
        "source".to_owned(),
        Ok(replication_to(Some("arn:aws:s3:::dest-bucket"))),
    );
    cloud.inline_policies.insert(
        "replication-role".to_owned(),
        vec![("broken".to_owned(), missing_effect.clone())],
    );

    let outcome = S3ReplicationRoleCheck::new(CheckSettings::default())
        .run(&cloud.client())
        .await;

    let result = &outcome.results[0];
    assert_eq!(result.status, CheckStatus::Error);
    assert!(result.message.contains("broken"));
    assert!(
        outcome.evidence[0].documents["scanned_iam_policies"][0]["parse_error"].is_string()
    );

    let mut cloud = FakeCloud::with_buckets(&["source"]);
    cloud.replications.insert(
        "source".to_owned(),
        Ok(replication_to(Some("arn:aws:s3:::dest-bucket"))),
    );
    cloud.inline_policies.insert(
        "replication-role".to_owned(),
        vec![
            ("broken".to_owned(), missing_effect),
            (
                "replicate".to_owned(),
                replicate_policy("arn:aws:s3:::dest-bucket/*"),
            ),
        ],
    );

    let outcome = S3ReplicationRoleCheck::new(CheckSettings::default())
        .run(&cloud.client())
        .await;

    assert_eq!(outcome.results[0].status, CheckStatus::Pass);
}

#[tokio::test]
async fn replication_without_configuration_or_destination() {
    let mut cloud = FakeCloud::with_buckets(&["unreplicated", "dangling"]);
    cloud
        .replications
        .insert("dangling".to_owned(), Ok(replication_to(None)));

    let outcome = S3ReplicationRoleCheck::new(CheckSettings::default())
        .run(&cloud.client())
        .await;

    assert_eq!(outcome.results[0].status, CheckStatus::Pass);
    assert_eq!(outcome.results[1].status, CheckStatus::Warn);
}

#[tokio::test]
async fn imdsv2_requires_session_tokens() {
    let instance = |id: &str, tokens: Option<&str>, endpoint: Option<&str>| Instance {
        instance_id: id.to_owned(),
        state: Some("running".to_owned()),
        metadata_options: Some(InstanceMetadataOptions {
            http_tokens: tokens.map(str::to_owned),
            http_endpoint: endpoint.map(str::to_owned),
        }),
        public_ip_address: None,
    };
    let cloud = FakeCloud {
        instances: vec![
            instance("i-required", Some("required"), Some("enabled")),
            instance("i-optional", Some("optional"), Some("enabled")),
            instance("i-disabled", Some("optional"), Some("disabled")),
        ],
        ..FakeCloud::default()
    };

    let outcome = Ec2Imdsv2Check::new(CheckSettings::default())
        .run(&cloud.client())
        .await;

    let statuses: Vec<_> = outcome.results.iter().map(|result| result.status).collect();
    assert_eq!(
        statuses,
        vec![CheckStatus::Pass, CheckStatus::Fail, CheckStatus::Pass]
    );
}

#[tokio::test]
async fn publicly_shared_snapshot_fails() {
    let snapshot = |id: &str| Snapshot {
        snapshot_id: id.to_owned(),
        volume_id: None,
        encrypted: false,
    };
    let mut cloud = FakeCloud {
        snapshots: vec![snapshot("snap-public"), snapshot("snap-private")],
        ..FakeCloud::default()
    };
    cloud.volume_permissions.insert(
        "snap-public".to_owned(),
        Ok(vec![CreateVolumePermission {
            group: Some("all".to_owned()),
            user_id: None,
        }]),
    );
    cloud.volume_permissions.insert(
        "snap-private".to_owned(),
        Ok(vec![CreateVolumePermission {
            group: None,
            user_id: Some("210987654321".to_owned()),
        }]),
    );

    let outcome = EbsSnapshotPrivateCheck::new(CheckSettings::default())
        .run(&cloud.client())
        .await;

    assert_eq!(outcome.results[0].status, CheckStatus::Fail);
    assert_eq!(outcome.results[1].status, CheckStatus::Pass);
}

#[tokio::test]
async fn root_account_checks_read_the_account_summary() {
    let cloud = FakeCloud {
        account_summary: Some(Ok(AccountSummary {
            account_mfa_enabled: false,
            account_access_keys_present: false,
        })),
        ..FakeCloud::default()
    };
    let client = cloud.client();

    let mfa = IamRootMfaCheck.run(&client).await;
    let keys = IamRootAccessKeyCheck.run(&client).await;

    assert_eq!(mfa.results[0].status, CheckStatus::Fail);
    assert_eq!(mfa.results[0].resource_id, "root");
    assert_eq!(keys.results[0].status, CheckStatus::Pass);
}

#[tokio::test]
async fn unreadable_account_summary_is_a_resourceless_error() {
    let cloud = FakeCloud {
        account_summary: Some(Err(service_error("AccessDenied"))),
        ..FakeCloud::default()
    };

    let outcome = IamRootMfaCheck.run(&cloud.client()).await;

    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].status, CheckStatus::Error);
    assert!(outcome.results[0].is_resourceless());
}

#[tokio::test]
async fn stale_active_access_keys_fail() {
    let key = |id: &str, status: &str, age_days: i64| AccessKey {
        access_key_id: id.to_owned(),
        status: status.to_owned(),
        create_date: Utc::now() - chrono::Duration::days(age_days),
    };
    let user = |name: &str| IamUser {
        user_name: name.to_owned(),
        create_date: None,
    };
    let mut cloud = FakeCloud {
        users: vec![user("fresh"), user("stale"), user("retired"), user("hidden")],
        ..FakeCloud::default()
    };
    cloud
        .access_keys
        .insert("fresh".to_owned(), Ok(vec![key("AKIAFRESH", "Active", 10)]));
    cloud.access_keys.insert(
        "stale".to_owned(),
        Ok(vec![
            key("AKIANEW", "Active", 5),
            key("AKIAOLD", "Active", 400),
        ]),
    );
    cloud
        .access_keys
        .insert("retired".to_owned(), Ok(vec![key("AKIAOFF", "Inactive", 400)]));
    cloud
        .access_keys
        .insert("hidden".to_owned(), Err(service_error("AccessDenied")));

    let outcome = IamAccessKeyAgeCheck::new(CheckSettings::default())
        .run(&cloud.client())
        .await;

    let statuses: Vec<_> = outcome.results.iter().map(|result| result.status).collect();
    assert_eq!(
        statuses,
        vec![
            CheckStatus::Pass,
            CheckStatus::Fail,
            CheckStatus::Pass,
            CheckStatus::Error
        ]
    );
    assert_eq!(
        outcome.results[1].details["stale_access_keys"][0]["access_key_id"],
        json!("AKIAOLD")
    );
    assert_eq!(outcome.results[1].details["max_age_days"], json!(90));
}

#[tokio::test]
async fn instances_with_public_ip_fail() {
    let instance = |id: &str, address: Option<&str>| Instance {
        instance_id: id.to_owned(),
        state: Some("running".to_owned()),
        metadata_options: None,
        public_ip_address: address.map(str::to_owned),
    };
    let cloud = FakeCloud {
        instances: vec![
            instance("i-public", Some("203.0.113.10")),
            instance("i-private", None),
        ],
        ..FakeCloud::default()
    };

    let outcome = Ec2PublicIpCheck::new(CheckSettings::default())
        .run(&cloud.client())
        .await;

    assert_eq!(outcome.results[0].status, CheckStatus::Fail);
    assert_eq!(
        outcome.results[0].details["public_ip_address"],
        json!("203.0.113.10")
    );
    assert_eq!(outcome.results[1].status, CheckStatus::Pass);
}

#[tokio::test]
async fn publicly_launchable_images_fail() {
    let image = |id: &str, public: bool| MachineImage {
        image_id: id.to_owned(),
        name: None,
        public,
    };
    let mut cloud = FakeCloud {
        images: vec![
            image("ami-shared", false),
            image("ami-flagged", true),
            image("ami-private", false),
            image("ami-flaky", false),
        ],
        ..FakeCloud::default()
    };
    cloud.launch_permissions.insert(
        "ami-shared".to_owned(),
        Ok(vec![LaunchPermission {
            group: Some("all".to_owned()),
            user_id: None,
        }]),
    );
    cloud.launch_permissions.insert(
        "ami-private".to_owned(),
        Ok(vec![LaunchPermission {
            group: None,
            user_id: Some("210987654321".to_owned()),
        }]),
    );
    cloud
        .launch_permissions
        .insert("ami-flaky".to_owned(), Err(service_error("RequestLimitExceeded")));

    let outcome = Ec2AmiPrivateCheck::new(CheckSettings::default())
        .run(&cloud.client())
        .await;

    let statuses: Vec<_> = outcome.results.iter().map(|result| result.status).collect();
    assert_eq!(
        statuses,
        vec![
            CheckStatus::Fail,
            CheckStatus::Fail,
            CheckStatus::Pass,
            CheckStatus::Error
        ]
    );
}
