use std::{env, path::PathBuf};

use crate::error::{PathError, PathResult};

pub trait PathResolver {
    /// Resolves a path string that may contain environment variables.
    ///
    /// Expands `$VAR` and `${VAR}`, resolves a leading `~` to the home directory and turns
    /// relative paths into absolute ones based on the current working directory.
    ///
    /// # Errors
    ///
    /// * [`PathError::Empty`] if the path is empty
    /// * [`PathError::CurrentDir`] if the current directory cannot be determined
    /// * [`PathError::MissingEnvVar`] if a referenced variable is undefined
    /// * [`PathError::UnclosedVariable`] if a `${` is never closed
    fn resolve_path(&self, path: &str) -> PathResult<PathBuf>;

    /// Returns the user's home directory.
    fn home_dir(&self) -> PathBuf;

    /// Returns `$XDG_CONFIG_HOME`, defaulting to `$HOME/.config`.
    fn xdg_config_home(&self) -> PathBuf;

    /// Returns `$XDG_DATA_HOME`, defaulting to `$HOME/.local/share`.
    fn xdg_data_home(&self) -> PathBuf;
}

/// The default [`PathResolver`] implementation using environment variables.
pub struct SystemPathResolver;

impl PathResolver for SystemPathResolver {
    fn resolve_path(&self, path: &str) -> PathResult<PathBuf> {
        let path = path.trim();

        if path.is_empty() {
            return Err(PathError::Empty);
        }

        let resolved = self.expand_variables(path)?;
        let path_buf = PathBuf::from(resolved);

        if path_buf.is_absolute() {
            Ok(path_buf)
        } else {
            env::current_dir()
                .map(|cwd| cwd.join(path_buf))
                .map_err(|err| PathError::CurrentDir { source: err })
        }
    }

    fn home_dir(&self) -> PathBuf {
        env::var("HOME").map(PathBuf::from).unwrap_or_else(|_| {
            env::var("USER")
                .map(|user| PathBuf::from(format!("/home/{user}")))
                .unwrap_or_else(|_| env::temp_dir())
        })
    }

    fn xdg_config_home(&self) -> PathBuf {
        env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| self.home_dir().join(".config"))
    }

    fn xdg_data_home(&self) -> PathBuf {
        env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| self.home_dir().join(".local/share"))
    }
}

impl SystemPathResolver {
    fn expand_variables(&self, path: &str) -> PathResult<String> {
        let mut result = String::with_capacity(path.len());
        let mut chars = path.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '$' => {
                    if chars.peek() == Some(&'{') {
                        chars.next();
                        let var_name = self.consume_until(&mut chars, '}')?;
                        self.expand_env_var(&var_name, &mut result, path)?;
                    } else {
                        let var_name = self.consume_var_name(&mut chars);
                        if var_name.is_empty() {
                            result.push('$');
                        } else {
                            self.expand_env_var(&var_name, &mut result, path)?;
                        }
                    }
                }
                '~' if result.is_empty() => result.push_str(&self.home_dir().to_string_lossy()),
                _ => result.push(c),
            }
        }

        Ok(result)
    }

    fn consume_until(
        &self,
        chars: &mut std::iter::Peekable<std::str::Chars>,
        delimiter: char,
    ) -> PathResult<String> {
        let mut var_name = String::new();

        for c in chars.by_ref() {
            if c == delimiter {
                return Ok(var_name);
            }
            var_name.push(c);
        }

        Err(PathError::UnclosedVariable {
            input: format!("${{{var_name}"),
        })
    }

    fn consume_var_name(&self, chars: &mut std::iter::Peekable<std::str::Chars>) -> String {
        let mut var_name = String::new();

        while let Some(c) = chars.next_if(|c| c.is_alphanumeric() || *c == '_') {
            var_name.push(c);
        }

        var_name
    }

    fn expand_env_var(
        &self,
        var_name: &str,
        result: &mut String,
        original: &str,
    ) -> PathResult<()> {
        match var_name {
            "HOME" => result.push_str(&self.home_dir().to_string_lossy()),
            "XDG_CONFIG_HOME" => result.push_str(&self.xdg_config_home().to_string_lossy()),
            "XDG_DATA_HOME" => result.push_str(&self.xdg_data_home().to_string_lossy()),
            _ => {
                let value = env::var(var_name).map_err(|_| PathError::MissingEnvVar {
                    input: original.into(),
                    var: var_name.into(),
                })?;
                result.push_str(&value);
            }
        }
        Ok(())
    }
}

/// Resolves a path string with the [`SystemPathResolver`].
pub fn resolve_path(path: &str) -> PathResult<PathBuf> {
    SystemPathResolver.resolve_path(path)
}

pub fn home_dir() -> PathBuf {
    SystemPathResolver.home_dir()
}

pub fn xdg_config_home() -> PathBuf {
    SystemPathResolver.xdg_config_home()
}

pub fn xdg_data_home() -> PathBuf {
    SystemPathResolver.xdg_data_home()
}
