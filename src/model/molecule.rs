//! 分子类型
//!
//! 定义节点状态的命名实体及其浓度。

use std::fmt;

/// 命名状态实体（“分子”）。名字相同即视为同一种分子。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Molecule(String);

impl Molecule {
    pub fn new(name: impl Into<String>) -> Molecule {
        Molecule(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Molecule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 浓度。非负实数；整数取值时可当计数使用。
pub type Concentration = f64;
