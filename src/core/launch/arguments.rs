// ─── Argument Assembly ───
// Builds the child's full command line from configuration, inherited runtime
// flags, resolved libraries, the extracted wrapper and forwarded arguments.

use std::path::Path;

use crate::core::config::RelaunchConfig;
use crate::core::context::LaunchArgs;
use crate::core::version::ResolvedRelease;

pub const WRAPPER_MAIN_CLASS: &str = "com.cleanroommc.relauncher.wrapper.RelaunchMainWrapper";
pub const PARENT_PROPERTY: &str = "-Dcleanroom.relauncher.parent=";
pub const MAIN_CLASS_PROPERTY: &str = "-Dcleanroom.relauncher.mainClass=";
pub const LIBRARY_PATH_PROPERTY: &str = "-Djava.library.path=";
pub const TWEAK_CLASS_OPTION: &str = "--tweakClass";
pub const FML_TWEAKER: &str = "net.minecraftforge.fml.common.launcher.FMLTweaker";

/// Inherited memory flags copied over when the user's args lack them.
const INHERITED_PREFIXES: [&str; 2] = ["-Xms", "-Xmx"];

/// Ordered child command line. Element 0 is the Java executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentVector(Vec<String>);

impl ArgumentVector {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn program(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn args(&self) -> &[String] {
        self.0.get(1..).unwrap_or(&[])
    }

    /// One shell-friendly line for logs.
    pub fn to_command_line(&self) -> String {
        self.0
            .iter()
            .map(|arg| shell_escape(arg))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl From<Vec<String>> for ArgumentVector {
    fn from(args: Vec<String>) -> Self {
        Self(args)
    }
}

/// Everything `assemble` reads.
pub struct AssemblyInput<'a> {
    pub config: &'a RelaunchConfig,
    pub inherited_runtime_args: &'a [String],
    pub resolved: &'a ResolvedRelease,
    pub wrapper_classpath: &'a Path,
    pub launch_args: &'a LaunchArgs,
    pub parent_pid: u32,
}

/// Build the child command line. Pure and deterministic; nothing is
/// validated, so malformed configuration passes through as given.
pub fn assemble(input: &AssemblyInput<'_>) -> ArgumentVector {
    let config = input.config;
    let user_args = config.args();
    let sep = classpath_separator();
    let mut args: Vec<String> = Vec::new();

    args.push(config.java_path().unwrap_or("java").to_string());

    let max_memory = config.max_memory();
    if !max_memory.is_empty() && !user_args.contains("-Xmx") {
        args.push(format!("-Xmx{max_memory}"));
    }

    // Any "-XX:+Use...GC" in the user's args, even split across tokens,
    // counts as a collector choice.
    let gc_type = config.gc_type();
    if !gc_type.is_empty() && !(user_args.contains("-XX:+Use") && user_args.contains("GC")) {
        args.push(format!("-XX:+Use{gc_type}"));
    }

    for flag in config.jvm_flags() {
        let option = format!("-XX:+{flag}");
        if !user_args.contains(&option) {
            args.push(option);
        }
    }

    let mut classpath = path_arg(input.wrapper_classpath);
    for library in input.resolved.library_paths() {
        classpath.push_str(sep);
        classpath.push_str(&path_arg(library));
    }
    args.push("-cp".into());
    args.push(classpath);

    if !user_args.is_empty() {
        args.extend(split_user_args(user_args));
    }

    // Host order wins; the first flag per prefix is taken.
    for inherited in input.inherited_runtime_args {
        let fills_gap = INHERITED_PREFIXES.iter().any(|prefix| {
            inherited.starts_with(prefix) && !args.iter().any(|arg| arg.starts_with(prefix))
        });
        if fills_gap {
            args.push(inherited.clone());
        }
    }

    args.push(format!("{PARENT_PROPERTY}{}", input.parent_pid));
    args.push(format!("{MAIN_CLASS_PROPERTY}{}", input.resolved.main_class()));
    args.push(format!(
        "{LIBRARY_PATH_PROPERTY}{}",
        input
            .resolved
            .natives_paths()
            .map(path_arg)
            .collect::<Vec<_>>()
            .join(sep)
    ));

    args.push(WRAPPER_MAIN_CLASS.into());

    for (key, value) in input.launch_args.iter() {
        args.push(key.to_string());
        args.push(value.to_string());
    }

    args.push(TWEAK_CLASS_OPTION.into());
    args.push(FML_TWEAKER.into());

    ArgumentVector(args)
}

pub fn classpath_separator() -> &'static str {
    if cfg!(target_os = "windows") {
        ";"
    } else {
        ":"
    }
}

/// Split on single spaces and trim each token. Trailing empty tokens are
/// dropped; interior ones are kept.
fn split_user_args(raw: &str) -> Vec<String> {
    let mut tokens: Vec<String> = raw.split(' ').map(|t| t.trim().to_string()).collect();
    while tokens.last().is_some_and(String::is_empty) {
        tokens.pop();
    }
    tokens
}

fn path_arg(path: &Path) -> String {
    let text = path.to_string_lossy().to_string();

    // Java classpath handling rejects extended-length prefixes.
    #[cfg(target_os = "windows")]
    {
        if let Some(stripped) = text.strip_prefix(r"\\?\") {
            return stripped.to_string();
        }
    }

    text
}

fn shell_escape(raw: &str) -> String {
    if raw.is_empty() {
        return "\"\"".to_string();
    }

    if raw.chars().all(|ch| {
        ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | ':' | '\\' | '=' | '+')
    }) {
        return raw.to_string();
    }

    format!("\"{}\"", raw.replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::core::catalog::Release;
    use crate::core::version::{resolve_release, VersionDescriptor, VersionResolver};
    use crate::core::error::RelaunchResult;

    struct Fixture {
        _temp: tempfile::TempDir,
        resolved: ResolvedRelease,
        libs: Vec<PathBuf>,
        natives: PathBuf,
        wrapper: PathBuf,
    }

    struct Fixed(Vec<VersionDescriptor>);

    impl VersionResolver for Fixed {
        fn resolve(&self, _release: &Release) -> RelaunchResult<Vec<VersionDescriptor>> {
            Ok(self.0.clone())
        }
    }

    fn fixture() -> Fixture {
        let temp = tempfile::tempdir().unwrap();
        let libs: Vec<PathBuf> = ["cleanroom.jar", "asm.jar", "lwjgl.jar"]
            .iter()
            .map(|name| {
                let p = temp.path().join(name);
                std::fs::write(&p, b"jar").unwrap();
                p
            })
            .collect();
        let natives = temp.path().join("natives");
        std::fs::create_dir_all(&natives).unwrap();
        let wrapper = temp.path().join("wrapper");

        let resolver = Fixed(vec![
            VersionDescriptor {
                main_class: "top.outlands.foundation.boot.Foundation".into(),
                library_paths: vec![libs[0].clone(), libs[1].clone()],
                natives_paths: vec![natives.clone()],
            },
            VersionDescriptor {
                main_class: "ignored.Main".into(),
                library_paths: vec![libs[2].clone()],
                natives_paths: vec![],
            },
        ]);
        let resolved =
            resolve_release(&resolver, &Release::new("0.3.0-alpha", "0.3.0-alpha", 0)).unwrap();

        Fixture {
            _temp: temp,
            resolved,
            libs,
            natives,
            wrapper,
        }
    }

    fn assemble_with(fx: &Fixture, config: &RelaunchConfig, inherited: &[&str]) -> Vec<String> {
        let inherited: Vec<String> = inherited.iter().map(|s| s.to_string()).collect();
        let launch_args: LaunchArgs = [("--username", "Steve"), ("--gameDir", "/games/mc")]
            .into_iter()
            .collect();
        assemble(&AssemblyInput {
            config,
            inherited_runtime_args: &inherited,
            resolved: &fx.resolved,
            wrapper_classpath: &fx.wrapper,
            launch_args: &launch_args,
            parent_pid: 4242,
        })
        .into_vec()
    }

    fn base_config() -> RelaunchConfig {
        RelaunchConfig::default().with_java_path("/opt/jdk21/bin/java")
    }

    fn count(args: &[String], needle: &str) -> usize {
        args.iter().filter(|a| *a == needle).count()
    }

    #[test]
    fn full_vector_in_order() {
        let fx = fixture();
        let config = base_config().with_jvm_flags(["UnlockExperimentalVMOptions"]);
        let args = assemble_with(&fx, &config, &[]);

        let sep = classpath_separator();
        let classpath = format!(
            "{}{sep}{}{sep}{}{sep}{}",
            fx.wrapper.display(),
            fx.libs[0].display(),
            fx.libs[1].display(),
            fx.libs[2].display()
        );
        let expected = vec![
            "/opt/jdk21/bin/java".to_string(),
            "-Xmx4096M".into(),
            "-XX:+UseG1GC".into(),
            "-XX:+UnlockExperimentalVMOptions".into(),
            "-cp".into(),
            classpath,
            "-Dcleanroom.relauncher.parent=4242".into(),
            "-Dcleanroom.relauncher.mainClass=top.outlands.foundation.boot.Foundation".into(),
            format!("-Djava.library.path={}", fx.natives.display()),
            WRAPPER_MAIN_CLASS.into(),
            "--username".into(),
            "Steve".into(),
            "--gameDir".into(),
            "/games/mc".into(),
            "--tweakClass".into(),
            FML_TWEAKER.into(),
        ];
        assert_eq!(args, expected);
    }

    #[test]
    fn max_memory_emitted_once() {
        let fx = fixture();
        let args = assemble_with(&fx, &base_config(), &["-Xmx1G"]);
        assert_eq!(count(&args, "-Xmx4096M"), 1);
        assert!(!args.iter().any(|a| a == "-Xmx1G"));
    }

    #[test]
    fn user_xmx_suppresses_configured_max_memory() {
        let fx = fixture();
        let config = base_config().with_args("-Xmx6G");
        let args = assemble_with(&fx, &config, &[]);
        assert_eq!(count(&args, "-Xmx4096M"), 0);
        assert_eq!(count(&args, "-Xmx6G"), 1);
    }

    #[test]
    fn gc_heuristic_matches_across_tokens() {
        let fx = fixture();
        // Neither token names a collector, but both substrings are present.
        let config = base_config().with_args("-XX:+UseStringDeduplication -Dmod.GC=off");
        let args = assemble_with(&fx, &config, &[]);
        assert_eq!(count(&args, "-XX:+UseG1GC"), 0);

        let config = base_config().with_args("-XX:+UseZGC");
        let args = assemble_with(&fx, &config, &[]);
        assert_eq!(count(&args, "-XX:+UseG1GC"), 0);
        assert_eq!(count(&args, "-XX:+UseZGC"), 1);
    }

    #[test]
    fn empty_memory_and_gc_are_skipped() {
        let fx = fixture();
        let config = base_config().with_max_memory("").with_gc_type("");
        let args = assemble_with(&fx, &config, &[]);
        assert!(!args.iter().any(|a| a.starts_with("-Xmx") || a.starts_with("-XX:+Use")));
    }

    #[test]
    fn flags_already_in_args_are_not_repeated() {
        let fx = fixture();
        let config = base_config()
            .with_jvm_flags(["AlwaysPreTouch", "UseCompactObjectHeaders"])
            .with_args("-XX:+AlwaysPreTouch");
        let args = assemble_with(&fx, &config, &[]);
        assert_eq!(count(&args, "-XX:+AlwaysPreTouch"), 1);
        assert_eq!(count(&args, "-XX:+UseCompactObjectHeaders"), 1);
    }

    #[test]
    fn user_memory_args_block_inherited_ones() {
        let fx = fixture();
        let config = base_config().with_args("-Xms1G -Xmx2G");
        let args = assemble_with(&fx, &config, &["-Xms512M", "-Xmx8G"]);

        let memory: Vec<_> = args
            .iter()
            .filter(|a| a.starts_with("-Xms") || a.starts_with("-Xmx"))
            .collect();
        assert_eq!(memory, vec!["-Xms1G", "-Xmx2G"]);
    }

    #[test]
    fn inherited_xms_fills_the_gap() {
        let fx = fixture();
        let args = assemble_with(&fx, &base_config(), &["-Dfoo=bar", "-Xms512M", "-Xms1G"]);
        assert_eq!(count(&args, "-Xms512M"), 1);
        assert_eq!(count(&args, "-Xms1G"), 0);
        assert_eq!(count(&args, "-Dfoo=bar"), 0);
    }

    #[test]
    fn inherited_memory_flags_keep_host_order() {
        let fx = fixture();
        let config = base_config().with_max_memory("");
        let args = assemble_with(&fx, &config, &["-Xmx8G", "-Xms512M"]);
        let xmx = args.iter().position(|a| a == "-Xmx8G").unwrap();
        let xms = args.iter().position(|a| a == "-Xms512M").unwrap();
        assert!(xmx < xms);
    }

    #[test]
    fn user_args_split_on_single_spaces() {
        assert_eq!(split_user_args("-Da=1  -Db=2 "), vec!["-Da=1", "", "-Db=2"]);
        assert_eq!(split_user_args("   "), Vec::<String>::new());
    }

    #[test]
    fn user_args_follow_classpath() {
        let fx = fixture();
        let config = base_config().with_args("-Dfml.readTimeout=180");
        let args = assemble_with(&fx, &config, &[]);
        let cp = args.iter().position(|a| a == "-cp").unwrap();
        assert_eq!(args[cp + 2], "-Dfml.readTimeout=180");
    }

    #[test]
    fn command_line_quotes_spaces() {
        let vector = ArgumentVector::from(vec!["/opt/my jdk/java".to_string(), "-Xmx4G".into()]);
        assert_eq!(vector.to_command_line(), "\"/opt/my jdk/java\" -Xmx4G");
        assert_eq!(vector.program(), Some("/opt/my jdk/java"));
        assert_eq!(vector.args(), ["-Xmx4G".to_string()]);
    }
}
