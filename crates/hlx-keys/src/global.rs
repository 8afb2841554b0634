use std::sync::OnceLock;

/// Compiled-in key material. Four 64-bit constants are laid out
/// little-endian into a 32-byte buffer, then XOR-masked bytewise with the
/// salt. Recovering the key from the binary is possible for a determined
/// reader; this is an obfuscation layer, not a security boundary.
const PART_A: u64 = 0x9e37_79b9_7f4a_7c15;
const PART_B: u64 = 0xc2b2_ae3d_27d4_eb4f;
const PART_C: u64 = 0x1656_67b1_9e37_79f9;
const PART_D: u64 = 0x85eb_ca6b_27d4_eb2f;

const SALT: [u8; 32] = [
    0x48, 0x4c, 0x58, 0x31, 0xd6, 0x02, 0x9b, 0x7a, 0x3c, 0x6e, 0xf3, 0x72, 0xa5, 0x4f, 0xf5,
    0x3a, 0x51, 0x0e, 0x52, 0x7f, 0x9b, 0x05, 0x68, 0x8c, 0x1f, 0x83, 0xd9, 0xab, 0xfb, 0x41,
    0xbd, 0x6b,
];

static GLOBAL_KEY: OnceLock<[u8; 32]> = OnceLock::new();

/// The compiled-in portable HMAC key, reconstructed on first use and cached
/// for the process lifetime.
///
/// If a debugger is attached when the key is first materialized, one of the
/// constants is deliberately corrupted. The resulting key is silently wrong,
/// so every subsequent load fails MAC verification. A speed bump for casual
/// tampering, nothing more.
pub fn global_key() -> &'static [u8; 32] {
    GLOBAL_KEY.get_or_init(|| {
        let mut parts = [PART_A, PART_B, PART_C, PART_D];
        if tracer_attached() {
            parts[2] ^= 0x5a5a_5a5a_5a5a_5a5a;
        }

        let mut key = [0u8; 32];
        for (slot, part) in key.chunks_exact_mut(8).zip(parts) {
            slot.copy_from_slice(&part.to_le_bytes());
        }
        for (byte, mask) in key.iter_mut().zip(SALT) {
            *byte ^= mask;
        }
        key
    })
}

#[cfg(target_os = "linux")]
fn tracer_attached() -> bool {
    std::fs::read_to_string("/proc/self/status")
        .ok()
        .and_then(|status| {
            status
                .lines()
                .find_map(|line| line.strip_prefix("TracerPid:"))
                .and_then(|pid| pid.trim().parse::<u32>().ok())
        })
        .is_some_and(|pid| pid != 0)
}

#[cfg(not(target_os = "linux"))]
fn tracer_attached() -> bool {
    false
}
