//! 确定性随机数
//!
//! 仿真里的全部随机性都经由这里：同一个种子必然跑出逐位一致的轨迹。
//! 不依赖外部 RNG crate，保证跨平台、跨版本可复现。

/// xorshift64* 生成器。
#[derive(Debug, Clone)]
pub struct SimRng {
    state: u64,
}

impl SimRng {
    pub fn new(seed: u64) -> SimRng {
        // 先过一遍 splitmix64 扩散，避免相邻小种子产生相关序列；
        // 全零状态会让 xorshift 卡死，压到 1。
        let mixed = mix64(seed);
        SimRng {
            state: if mixed == 0 { 1 } else { mixed },
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state >> 12;
        self.state ^= self.state << 25;
        self.state ^= self.state >> 27;
        self.state.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// [0, 1) 区间均匀分布。
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// [0, n) 区间均匀整数；n 为 0 时返回 0。
    pub fn next_index(&mut self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        (self.next_u64() % n as u64) as usize
    }

    /// 速率为 `rate` 的指数分布采样（事件间隔，秒）。
    ///
    /// `next_f64` 落在 [0,1)，因此 `1 - u` 落在 (0,1]，对数恒有定义。
    pub fn next_exp(&mut self, rate: f64) -> f64 {
        debug_assert!(rate > 0.0, "exponential rate must be positive, got {rate}");
        -(1.0 - self.next_f64()).ln() / rate
    }
}

pub(crate) fn mix64(mut x: u64) -> u64 {
    // splitmix64
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}
