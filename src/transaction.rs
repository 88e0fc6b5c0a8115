//! Transaction building for the collection program.
//!
//! Legacy message layout, Anchor instruction encoding. Only single-instruction
//! messages are needed here.

use sha2::{Digest, Sha256};

use crate::{Address, PortalError};

/// Largest signed transaction the cluster accepts
pub const PACKET_DATA_SIZE: usize = 1232;

/// Account reference inside an instruction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccountMeta {
    pub address: Address,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    pub fn writable(address: Address, is_signer: bool) -> Self {
        Self {
            address,
            is_signer,
            is_writable: true,
        }
    }

    pub fn readonly(address: Address, is_signer: bool) -> Self {
        Self {
            address,
            is_signer,
            is_writable: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub program_id: Address,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

/// First 8 bytes of `sha256("<namespace>:<name>")`
///
/// Anchor prefixes instruction data with the `global` namespace and account
/// data with the `account` namespace.
pub fn anchor_discriminator(namespace: &str, name: &str) -> [u8; 8] {
    let hash = Sha256::new()
        .chain_update(namespace.as_bytes())
        .chain_update(b":")
        .chain_update(name.as_bytes())
        .finalize();
    let mut discriminator = [0u8; 8];
    discriminator.copy_from_slice(&hash[..8]);
    discriminator
}

/// `startStuffOff` with accounts `{baseAccount, user, systemProgram}`
///
/// The base account signs because the instruction allocates it.
pub fn start_stuff_off(program_id: Address, base_account: Address, user: Address) -> Instruction {
    Instruction {
        program_id,
        accounts: vec![
            AccountMeta::writable(base_account, true),
            AccountMeta::writable(user, true),
            AccountMeta::readonly(Address::SYSTEM_PROGRAM, false),
        ],
        data: anchor_discriminator("global", "start_stuff_off").to_vec(),
    }
}

/// `addGif(link)` with accounts `{baseAccount, user}`
pub fn add_gif(
    program_id: Address,
    base_account: Address,
    user: Address,
    link: &str,
) -> Result<Instruction, PortalError> {
    let mut data = anchor_discriminator("global", "add_gif").to_vec();
    let args = borsh::to_vec(link)
        .map_err(|e| PortalError::invalid_input(format!("cannot encode link: {}", e)))?;
    data.extend_from_slice(&args);

    Ok(Instruction {
        program_id,
        accounts: vec![
            AccountMeta::writable(base_account, false),
            AccountMeta::writable(user, true),
        ],
        data,
    })
}

/// Compiled legacy message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    num_required_signatures: u8,
    num_readonly_signed: u8,
    num_readonly_unsigned: u8,
    account_keys: Vec<Address>,
    recent_blockhash: [u8; 32],
    program_id_index: u8,
    account_indexes: Vec<u8>,
    data: Vec<u8>,
}

impl Message {
    /// Compile a single instruction with `payer` as fee payer
    ///
    /// Keys are ordered writable signers, readonly signers, writable
    /// non-signers, readonly non-signers, with the payer first.
    pub fn compile(payer: &Address, instruction: &Instruction, recent_blockhash: [u8; 32]) -> Self {
        let mut metas: Vec<AccountMeta> = vec![AccountMeta::writable(*payer, true)];
        let account_slots: Vec<usize> = instruction
            .accounts
            .iter()
            .map(|meta| intern(&mut metas, meta))
            .collect();
        let program_slot = intern(&mut metas, &AccountMeta::readonly(instruction.program_id, false));

        // Stable sort, so the payer stays first among writable signers
        let mut order: Vec<usize> = (0..metas.len()).collect();
        order.sort_by_key(|&slot| key_rank(&metas[slot]));
        let mut key_index = vec![0u8; metas.len()];
        for (position, &slot) in order.iter().enumerate() {
            key_index[slot] = position as u8;
        }

        let count = |rank: u8| metas.iter().filter(|m| key_rank(m) == rank).count() as u8;
        let num_readonly_signed = count(1);

        Self {
            num_required_signatures: count(0) + num_readonly_signed,
            num_readonly_signed,
            num_readonly_unsigned: count(3),
            account_keys: order.iter().map(|&slot| metas[slot].address).collect(),
            recent_blockhash,
            program_id_index: key_index[program_slot],
            account_indexes: account_slots.iter().map(|&slot| key_index[slot]).collect(),
            data: instruction.data.clone(),
        }
    }

    /// Keys whose signatures the transaction needs, in signature order
    pub fn signers(&self) -> &[Address] {
        &self.account_keys[..self.num_required_signatures as usize]
    }

    pub fn account_keys(&self) -> &[Address] {
        &self.account_keys
    }

    /// Wire bytes that every signer signs
    pub fn serialize(&self) -> Vec<u8> {
        let mut msg = Vec::with_capacity(PACKET_DATA_SIZE);

        // Header
        msg.push(self.num_required_signatures);
        msg.push(self.num_readonly_signed);
        msg.push(self.num_readonly_unsigned);

        // Account keys
        append_shortvec(&mut msg, self.account_keys.len());
        for key in &self.account_keys {
            msg.extend_from_slice(key.as_bytes());
        }

        // Recent blockhash
        msg.extend_from_slice(&self.recent_blockhash);

        // Single instruction
        append_shortvec(&mut msg, 1);
        msg.push(self.program_id_index);
        append_shortvec(&mut msg, self.account_indexes.len());
        msg.extend_from_slice(&self.account_indexes);
        append_shortvec(&mut msg, self.data.len());
        msg.extend_from_slice(&self.data);

        msg
    }

    /// Size of the signed wire transaction carrying this message
    pub fn transaction_len(&self) -> usize {
        let signatures = self.num_required_signatures as usize;
        let mut prefix = Vec::with_capacity(3);
        append_shortvec(&mut prefix, signatures);
        prefix.len() + signatures * 64 + self.serialize().len()
    }

    /// Reject messages whose transaction would exceed the packet limit
    pub fn ensure_fits(&self) -> Result<(), PortalError> {
        let len = self.transaction_len();
        if len > PACKET_DATA_SIZE {
            return Err(PortalError::invalid_input(format!(
                "transaction would be {} bytes, limit is {}",
                len, PACKET_DATA_SIZE
            )));
        }
        Ok(())
    }
}

/// Deduplicate `meta` into `metas`, merging signer/writable flags; returns its slot
fn intern(metas: &mut Vec<AccountMeta>, meta: &AccountMeta) -> usize {
    match metas.iter().position(|m| m.address == meta.address) {
        Some(slot) => {
            metas[slot].is_signer |= meta.is_signer;
            metas[slot].is_writable |= meta.is_writable;
            slot
        }
        None => {
            metas.push(*meta);
            metas.len() - 1
        }
    }
}

/// Key ordering: writable signers, readonly signers, writable, readonly
fn key_rank(meta: &AccountMeta) -> u8 {
    match (meta.is_signer, meta.is_writable) {
        (true, true) => 0,
        (true, false) => 1,
        (false, true) => 2,
        (false, false) => 3,
    }
}

/// `[sig_count][signatures][message]`
pub fn assemble(message: &[u8], signatures: &[[u8; 64]]) -> Vec<u8> {
    let mut tx = Vec::with_capacity(1 + signatures.len() * 64 + message.len());
    append_shortvec(&mut tx, signatures.len());
    for signature in signatures {
        tx.extend_from_slice(signature);
    }
    tx.extend_from_slice(message);
    tx
}

/// Append a compact-u16 encoded value ("shortvec").
fn append_shortvec(buf: &mut Vec<u8>, mut value: usize) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}
