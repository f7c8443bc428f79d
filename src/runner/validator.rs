use crate::config::Settings;

/// 检查命令是否包含必需参数、是否包含禁止参数
///
/// 按固定顺序返回全部问题，空列表表示命令可以执行
pub fn validate(command: &str, settings: &Settings) -> Vec<String> {
    let mut errors = Vec::new();

    if !command.contains(&settings.required_flag) {
        errors.push(format!(
            "{} must be provided in `{}`",
            settings.required_flag, command
        ));
    }

    if command.contains(&settings.forbidden_flag) {
        errors.push(format!(
            "{} cannot be provided in `{}`",
            settings.forbidden_flag, command
        ));
    }

    errors
}

/// 校验所有命令，错误按输入顺序拼接
pub fn validate_all<'a, I>(commands: I, settings: &Settings) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    commands
        .into_iter()
        .flat_map(|command| validate(command, settings))
        .collect()
}
