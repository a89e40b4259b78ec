use anyhow::{anyhow, Context, Result};
use log::info;
use mldeploy_client::{Bucket, BucketName, Client, NewBucket};
use rand::Rng;
use structopt::StructOpt;

use crate::{config::DeployConfig, printer::Printer};

#[derive(Debug, StructOpt)]
pub struct CreateBucketArgs {
    #[structopt(name = "bucket-name")]
    /// Name of the new bucket. A random name is generated if neither this nor
    /// the configuration file set one.
    name: Option<BucketName>,

    #[structopt(long = "location")]
    /// Location of the new bucket. Defaults to the configured location.
    location: Option<String>,
}

/// Prefix of generated bucket names, followed by `RANDOM_SUFFIX_LEN` digits.
const RANDOM_NAME_PREFIX: &str = "cloud_project_model_storage";
const RANDOM_SUFFIX_LEN: usize = 5;

#[derive(Debug)]
pub enum Provisioned {
    Created(Bucket),
    AlreadyExists,
}

pub fn create(
    client: &Client,
    args: &CreateBucketArgs,
    config: &DeployConfig,
    printer: &Printer,
) -> Result<()> {
    let CreateBucketArgs { name, location } = args;

    let name = resolve_bucket_name(name.as_ref(), config)?;
    let location = location.as_deref().unwrap_or(&config.location);

    if let Provisioned::Created(bucket) = provision_bucket(client, &name, location)? {
        printer.print_resources(&[bucket])?;
    }
    Ok(())
}

/// Create the bucket, treating an existing bucket of the same name as success.
pub fn provision_bucket(client: &Client, name: &BucketName, location: &str) -> Result<Provisioned> {
    match client.create_bucket(NewBucket { name, location }) {
        Ok(bucket) => {
            info!("Created bucket `{}` in {}", name, location);
            Ok(Provisioned::Created(bucket))
        }
        Err(error) if error.is_already_exists() => {
            info!("Bucket `{}` already exists", name);
            Ok(Provisioned::AlreadyExists)
        }
        Err(error) => {
            Err(error).with_context(|| format!("Operation to create bucket `{name}` has failed"))
        }
    }
}

/// The bucket from the command line, else the configured one, else a fresh random name.
pub fn resolve_bucket_name(name: Option<&BucketName>, config: &DeployConfig) -> Result<BucketName> {
    if let Some(name) = name {
        return Ok(name.clone());
    }
    match &config.bucket_name {
        Some(name) => name
            .parse()
            .with_context(|| format!("Invalid bucket name `{name}` in configuration")),
        None => Ok(random_bucket_name()),
    }
}

/// Like `resolve_bucket_name`, for steps which act on an existing bucket.
pub fn require_bucket_name(name: Option<&BucketName>, config: &DeployConfig) -> Result<BucketName> {
    if name.is_none() && config.bucket_name.is_none() {
        return Err(anyhow!(
            "No bucket given, pass `--bucket` or set `bucket_name` in the configuration file"
        ));
    }
    resolve_bucket_name(name, config)
}

pub fn random_bucket_name() -> BucketName {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..RANDOM_SUFFIX_LEN)
        .map(|_| char::from(b'0' + rng.gen_range(1..=9)))
        .collect();
    BucketName(format!("{RANDOM_NAME_PREFIX}{suffix}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::test_client;
    use mockito::{Matcher, Server};

    #[test]
    fn test_random_bucket_name_format() {
        let name = random_bucket_name();
        let suffix = name.0.strip_prefix(RANDOM_NAME_PREFIX).unwrap();
        assert_eq!(suffix.len(), RANDOM_SUFFIX_LEN);
        assert!(suffix.chars().all(|c| ('1'..='9').contains(&c)), "{suffix}");
        assert!(name.0.parse::<BucketName>().is_ok());
    }

    #[test]
    fn test_resolve_bucket_name_prefers_argument() {
        let config = DeployConfig {
            bucket_name: Some("configured_bucket".to_owned()),
            ..Default::default()
        };
        let name = BucketName("argument_bucket".to_owned());
        assert_eq!(resolve_bucket_name(Some(&name), &config).unwrap(), name);
        assert_eq!(
            resolve_bucket_name(None, &config).unwrap().0,
            "configured_bucket"
        );
        assert!(require_bucket_name(None, &DeployConfig::default()).is_err());
    }

    #[test]
    fn test_provision_twice_tolerates_existing_bucket() {
        let mut server = Server::new();
        let client = test_client(&server);
        let name = BucketName("model_bucket".to_owned());

        let created = server
            .mock("POST", "/storage/v1/b")
            .match_query(Matcher::Any)
            .with_body(r#"{"name": "model_bucket"}"#)
            .expect(1)
            .create();
        assert!(matches!(
            provision_bucket(&client, &name, "us-central1").unwrap(),
            Provisioned::Created(_)
        ));
        created.assert();
        created.remove();

        let conflict = server
            .mock("POST", "/storage/v1/b")
            .match_query(Matcher::Any)
            .with_status(409)
            .with_body(r#"{"error": {"code": 409, "message": "You already own this bucket.", "status": "ALREADY_EXISTS"}}"#)
            .expect(1)
            .create();
        assert!(matches!(
            provision_bucket(&client, &name, "us-central1").unwrap(),
            Provisioned::AlreadyExists
        ));
        conflict.assert();
    }

    #[test]
    fn test_provision_propagates_other_failures() {
        let mut server = Server::new();
        let client = test_client(&server);
        server
            .mock("POST", "/storage/v1/b")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body(r#"{"error": {"code": 403, "message": "Permission denied", "status": "PERMISSION_DENIED"}}"#)
            .create();

        let error = provision_bucket(&client, &BucketName("model_bucket".to_owned()), "us-central1")
            .unwrap_err();
        assert!(format!("{error:#}").contains("Permission denied"), "{error:#}");
    }
}
