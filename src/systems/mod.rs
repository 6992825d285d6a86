pub mod sdk;
#[cfg(feature="system-inventory")]        pub mod inventory;
#[cfg(feature="system-constrained_walk")] pub mod constrained_walk;
