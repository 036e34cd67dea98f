//! Typed bindings for the deployed HerbChain contract.
//!
//! Generated from `abi/HerbChain.json`, which lists only the functions this
//! client calls.

use ethers::contract::abigen;

abigen!(HerbChain, "abi/HerbChain.json");
