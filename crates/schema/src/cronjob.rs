//! Scheduled jobs (batch/v1).

use k8s_openapi::api::batch::v1::{CronJobSpec, JobSpec, JobTemplateSpec};
use kubeform_core::{ConfigTree, Result};

use crate::fields::{Att, Fields};
use crate::meta::{expand_label_selector, expand_metadata, flatten_label_selector, flatten_metadata};
use crate::pod::{expand_pod_template, flatten_pod_template};

fn expand_job_spec(s: &Fields<'_>) -> Result<JobSpec> {
    Ok(JobSpec {
        active_deadline_seconds: s.int("active_deadline_seconds")?,
        backoff_limit: s.int32("backoff_limit")?,
        completions: s.int32("completions")?,
        parallelism: s.int32("parallelism")?,
        manual_selector: s.boolean("manual_selector")?,
        selector: s.block("selector")?.map(|b| expand_label_selector(&b)).transpose()?,
        template: expand_pod_template(&s.required_block("template")?)?,
        ttl_seconds_after_finished: s.int32("ttl_seconds_after_finished")?,
        ..Default::default()
    })
}

fn flatten_job_spec(s: &JobSpec) -> ConfigTree {
    Att::new()
        .int("active_deadline_seconds", s.active_deadline_seconds)
        .int("backoff_limit", s.backoff_limit)
        .int("completions", s.completions)
        .int("parallelism", s.parallelism)
        .boolean("manual_selector", s.manual_selector)
        .block("selector", s.selector.as_ref().map(flatten_label_selector))
        .block("template", Some(flatten_pod_template(&s.template)))
        .int("ttl_seconds_after_finished", s.ttl_seconds_after_finished)
        .into_block()
}

fn expand_job_template(t: &Fields<'_>) -> Result<JobTemplateSpec> {
    Ok(JobTemplateSpec {
        metadata: t.block("metadata")?.map(|m| expand_metadata(&m)).transpose()?,
        spec: Some(expand_job_spec(&t.required_block("spec")?)?),
    })
}

fn flatten_job_template(t: &JobTemplateSpec) -> ConfigTree {
    Att::new()
        .block("metadata", t.metadata.as_ref().map(flatten_metadata))
        .block("spec", t.spec.as_ref().map(flatten_job_spec))
        .into_block()
}

pub(crate) fn expand_cronjob_spec(s: &Fields<'_>) -> Result<CronJobSpec> {
    Ok(CronJobSpec {
        schedule: s.required_string("schedule")?,
        time_zone: s.string("time_zone")?,
        concurrency_policy: s.string("concurrency_policy")?,
        suspend: s.boolean("suspend")?,
        starting_deadline_seconds: s.int("starting_deadline_seconds")?,
        successful_jobs_history_limit: s.int32("successful_jobs_history_limit")?,
        failed_jobs_history_limit: s.int32("failed_jobs_history_limit")?,
        job_template: expand_job_template(&s.required_block("job_template")?)?,
    })
}

pub(crate) fn flatten_cronjob_spec(s: &CronJobSpec) -> ConfigTree {
    Att::new()
        .string("schedule", Some(&s.schedule))
        .string("time_zone", s.time_zone.as_ref())
        .string("concurrency_policy", s.concurrency_policy.as_ref())
        .boolean("suspend", s.suspend)
        .int("starting_deadline_seconds", s.starting_deadline_seconds)
        .int("successful_jobs_history_limit", s.successful_jobs_history_limit)
        .int("failed_jobs_history_limit", s.failed_jobs_history_limit)
        .block("job_template", Some(flatten_job_template(&s.job_template)))
        .into_block()
}
