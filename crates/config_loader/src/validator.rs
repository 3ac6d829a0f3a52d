//! 配置校验模块
//!
//! 校验规则：
//! - streams 非空，producer 唯一
//! - expected_period_s > 0
//! - reference 流在 streams 中存在
//! - secondaries 不含 reference，且唯一
//! - 容差在 (0, 1) 区间内
//! - sink 必填字段齐全，queue_capacity > 0

use std::collections::HashSet;

use contracts::{ContractError, ExperimentBlueprint};

/// 校验 ExperimentBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &ExperimentBlueprint) -> Result<(), ContractError> {
    validate_streams(blueprint)?;
    validate_sync_config(blueprint)?;
    validate_sinks(blueprint)?;
    Ok(())
}

/// 校验流定义：非空、producer 唯一、周期合法
fn validate_streams(blueprint: &ExperimentBlueprint) -> Result<(), ContractError> {
    if blueprint.streams.is_empty() {
        return Err(ContractError::config_validation(
            "streams",
            "at least one stream must be configured",
        ));
    }

    let mut seen = HashSet::new();
    for stream in &blueprint.streams {
        if !seen.insert(stream.producer) {
            return Err(ContractError::config_validation(
                format!("streams[producer={}]", stream.producer),
                "duplicate producer",
            ));
        }
        if stream.expected_period_s <= 0.0 {
            return Err(ContractError::config_validation(
                format!("streams[{}].expected_period_s", stream.producer),
                format!(
                    "expected_period_s must be > 0, got {}",
                    stream.expected_period_s
                ),
            ));
        }
    }
    Ok(())
}

/// 校验同步配置
fn validate_sync_config(blueprint: &ExperimentBlueprint) -> Result<(), ContractError> {
    let sync = &blueprint.sync;

    // 容差是周期的分数：0 会拒绝一切，>= 1 会接受相邻 shot
    for (field, value) in [
        ("sync.tolerance_spacing", sync.tolerance_spacing),
        ("sync.tolerance_match", sync.tolerance_match),
    ] {
        if !(value > 0.0 && value < 1.0) {
            return Err(ContractError::config_validation(
                field,
                format!("tolerance must be in (0, 1), got {value}"),
            ));
        }
    }

    let configured: HashSet<_> = blueprint.streams.iter().map(|s| s.producer).collect();
    if !configured.contains(&sync.reference) {
        return Err(ContractError::config_validation(
            "sync.reference",
            format!("reference stream '{}' not found in streams", sync.reference),
        ));
    }

    let mut seen = HashSet::new();
    for secondary in &sync.secondaries {
        if *secondary == sync.reference {
            return Err(ContractError::config_validation(
                "sync.secondaries",
                format!("'{secondary}' is the reference and cannot also be a secondary"),
            ));
        }
        if !seen.insert(*secondary) {
            return Err(ContractError::config_validation(
                "sync.secondaries",
                format!("duplicate secondary '{secondary}'"),
            ));
        }
    }

    Ok(())
}

/// 校验 sink 配置
fn validate_sinks(blueprint: &ExperimentBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{idx}].name"),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(&sink.name) {
            return Err(ContractError::config_validation(
                format!("sinks[{idx}].name"),
                format!("duplicate sink name '{}'", sink.name),
            ));
        }
        if sink.queue_capacity == 0 {
            return Err(ContractError::config_validation(
                format!("sinks[{}].queue_capacity", sink.name),
                "queue_capacity must be > 0",
            ));
        }
    }
    Ok(())
}
