//! Identity command

use sharedwallet::Identity;

/// Print `count` freshly generated identities, one per line
pub fn generate(count: usize) {
    for _ in 0..count {
        println!("{}", Identity::generate());
    }
}
