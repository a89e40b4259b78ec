use anyhow::{Context, Result};
use log::info;
use mldeploy_client::{gs_uri, BucketName, Client, Object};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use structopt::StructOpt;

use crate::{
    commands::create::bucket::require_bucket_name,
    config::DeployConfig,
    printer::Printer,
    progress::new_progress_bar,
    utils::{relative_object_name, walk_files},
};

/// Per-file timeout for artifact uploads, model files can be large.
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, StructOpt)]
pub struct UploadModelArgs {
    #[structopt(long = "bucket")]
    /// Bucket to upload into. Defaults to the configured bucket.
    bucket: Option<BucketName>,

    #[structopt(long = "model-path", parse(from_os_str))]
    /// Local directory holding the model. Defaults to the configured path.
    model_path: Option<PathBuf>,

    #[structopt(long = "prefix")]
    /// Object name prefix in the bucket. Defaults to the configured prefix.
    prefix: Option<String>,
}

#[derive(Debug)]
pub enum UploadOutcome {
    /// Objects were already present under the prefix, nothing was uploaded.
    AlreadyExists,
    Uploaded(Vec<Object>),
}

pub fn upload(
    client: &Client,
    args: &UploadModelArgs,
    config: &DeployConfig,
    printer: &Printer,
) -> Result<()> {
    let UploadModelArgs {
        bucket,
        model_path,
        prefix,
    } = args;

    let bucket = require_bucket_name(bucket.as_ref(), config)?;
    let model_path = model_path.as_ref().unwrap_or(&config.local_model_path);
    let prefix = prefix.as_deref().unwrap_or(&config.bucket_model_path);

    if let UploadOutcome::Uploaded(objects) = upload_artifact(client, &bucket, model_path, prefix)?
    {
        printer.print_resources(&objects)?;
    }
    Ok(())
}

/// Copy every regular file below `root` to `{prefix}/{relative path}` in the bucket.
///
/// Does nothing if any object already exists under `prefix`. Only presence is
/// checked, not content.
pub fn upload_artifact(
    client: &Client,
    bucket_name: &BucketName,
    root: &Path,
    prefix: &str,
) -> Result<UploadOutcome> {
    let prefix = prefix.trim_matches('/');

    if client
        .has_objects_with_prefix(bucket_name, prefix)
        .with_context(|| format!("Could not list objects in bucket `{bucket_name}`"))?
    {
        info!(
            "Artifact already exists at `{}`, skipping upload",
            gs_uri(bucket_name, prefix)
        );
        return Ok(UploadOutcome::AlreadyExists);
    }

    let files = walk_files(root)?;
    info!(
        "Uploading {} files from `{}` to `{}`",
        files.len(),
        root.display(),
        gs_uri(bucket_name, prefix)
    );

    let progress_bar = new_progress_bar(files.len() as u64, "Files");
    let mut objects = Vec::with_capacity(files.len());
    for file in &files {
        let object_name = object_name(prefix, &relative_object_name(root, file)?);
        progress_bar.set_message(object_name.clone());
        let object = client
            .upload_file(bucket_name, &object_name, file, Some(UPLOAD_TIMEOUT))
            .with_context(|| format!("Could not upload `{}`", file.display()))?;
        objects.push(object);
        progress_bar.inc(1);
    }
    progress_bar.finish_and_clear();

    info!(
        "Uploaded {} files to `{}`",
        objects.len(),
        gs_uri(bucket_name, prefix)
    );
    Ok(UploadOutcome::Uploaded(objects))
}

fn object_name(prefix: &str, relative: &str) -> String {
    if prefix.is_empty() {
        relative.to_owned()
    } else {
        format!("{prefix}/{relative}")
    }
}
