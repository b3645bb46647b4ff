mod kube;

pub use kube::{AccessBundle, BundleBuilder, BundleIdentity, BUNDLE_IDENTITIES};
