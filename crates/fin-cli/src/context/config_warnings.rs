const SECTIONS: [&str; 3] = ["BACKEND", "AUTH", "GENERAL"];

/// Warn about `FINSIGHT_*` env vars that figment will ignore because they use
/// a single underscore between section and key.
pub fn warn_misnamed_env() {
    for warning in collect_env_warnings(std::env::vars()) {
        tracing::warn!("{warning}");
    }
}

fn collect_env_warnings<I>(env: I) -> Vec<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let env_keys = env.into_iter().map(|(key, _)| key).collect::<Vec<_>>();

    let mut warnings = SECTIONS
        .iter()
        .filter_map(|section| {
            let prefix = format!("FINSIGHT_{section}");
            let single = format!("{prefix}_");
            let double = format!("{prefix}__");
            let misnamed = env_keys
                .iter()
                .find(|key| key.starts_with(&single) && !key.starts_with(&double))?;
            Some(format!(
                "{misnamed} is ignored. Use double underscores (example: {prefix}__{}).",
                misnamed.trim_start_matches(&single)
            ))
        })
        .collect::<Vec<_>>();

    if env_keys.iter().any(|key| key == "FINSIGHT_TOKEN") {
        warnings.push(
            "FINSIGHT_TOKEN is ignored; the ID token is read from FINSIGHT_AUTH__TOKEN."
                .to_string(),
        );
    }

    warnings
}
