use hervor_classfile::cursor::Cursor;
use num_enum::TryFromPrimitive;

use crate::error::JvmError;

/// Primitive element type operand of `newarray` (JVMS table 6.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum ArrayType {
    Boolean = 4,
    Char = 5,
    Float = 6,
    Double = 7,
    Byte = 8,
    Short = 9,
    Int = 10,
    Long = 11,
}

/// One decoded instruction. The `_<n>` forms, the `wide` prefix and the
/// `_w` branches are normalized into their general shape during decode;
/// the operand width never matters past this point.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    // Constants.
    Nop,
    AconstNull,
    Iconst(i32),
    Lconst(i64),
    Fconst(f32),
    Dconst(f64),
    Bipush(i8),
    Sipush(i16),
    Ldc(u16),
    Ldc2W(u16),

    // Loads and stores.
    Iload(u16),
    Lload(u16),
    Fload(u16),
    Dload(u16),
    Aload(u16),
    Iaload,
    Laload,
    Faload,
    Daload,
    Aaload,
    Baload,
    Caload,
    Saload,
    Istore(u16),
    Lstore(u16),
    Fstore(u16),
    Dstore(u16),
    Astore(u16),
    Iastore,
    Lastore,
    Fastore,
    Dastore,
    Aastore,
    Bastore,
    Castore,
    Sastore,

    // Operand stack shuffles.
    Pop,
    Pop2,
    Dup,
    DupX1,
    DupX2,
    Dup2,
    Dup2X1,
    Dup2X2,
    Swap,

    // Math.
    Iadd,
    Ladd,
    Fadd,
    Dadd,
    Isub,
    Lsub,
    Fsub,
    Dsub,
    Imul,
    Lmul,
    Fmul,
    Dmul,
    Idiv,
    Ldiv,
    Fdiv,
    Ddiv,
    Irem,
    Lrem,
    Frem,
    Drem,
    Ineg,
    Lneg,
    Fneg,
    Dneg,
    Ishl,
    Lshl,
    Ishr,
    Lshr,
    Iushr,
    Lushr,
    Iand,
    Land,
    Ior,
    Lor,
    Ixor,
    Lxor,
    Iinc { index: u16, delta: i16 },

    // Conversions.
    I2l,
    I2f,
    I2d,
    L2i,
    L2f,
    L2d,
    F2i,
    F2l,
    F2d,
    D2i,
    D2l,
    D2f,
    I2b,
    I2c,
    I2s,

    // Comparisons and branches; offsets are relative to the
    // instruction's own pc.
    Lcmp,
    Fcmpl,
    Fcmpg,
    Dcmpl,
    Dcmpg,
    Ifeq(i32),
    Ifne(i32),
    Iflt(i32),
    Ifge(i32),
    Ifgt(i32),
    Ifle(i32),
    IfIcmpeq(i32),
    IfIcmpne(i32),
    IfIcmplt(i32),
    IfIcmpge(i32),
    IfIcmpgt(i32),
    IfIcmple(i32),
    IfAcmpeq(i32),
    IfAcmpne(i32),
    Ifnull(i32),
    Ifnonnull(i32),

    // Control.
    Goto(i32),
    Tableswitch { default: i32, low: i32, high: i32, offsets: Vec<i32> },
    Lookupswitch { default: i32, pairs: Vec<(i32, i32)> },
    Ireturn,
    Lreturn,
    Freturn,
    Dreturn,
    Areturn,
    Return,

    // References.
    Getstatic(u16),
    Putstatic(u16),
    Getfield(u16),
    Putfield(u16),
    Invokevirtual(u16),
    Invokespecial(u16),
    Invokestatic(u16),
    Invokeinterface(u16),
    New(u16),
    Newarray(ArrayType),
    Anewarray(u16),
    Arraylength,
    Athrow,
    Checkcast(u16),
    Instanceof(u16),
    Monitorenter,
    Monitorexit,
    Multianewarray { index: u16, dimensions: u8 },

    // Reserved range.
    InvokeNative,
}

impl Instruction {
    /// Reads the opcode at `pc` and fetches its operands; returns the
    /// instruction and the pc of the following one.
    pub fn decode(code: &[u8], pc: usize) -> Result<(Instruction, usize), JvmError> {
        let mut cursor = Cursor::at(code, pc);
        let opcode = cursor.read_u8()?;
        let instruction = match opcode {
            0x00 => Instruction::Nop,
            0x01 => Instruction::AconstNull,
            0x02..=0x08 => Instruction::Iconst(opcode as i32 - 0x03),
            0x09 | 0x0A => Instruction::Lconst((opcode - 0x09) as i64),
            0x0B..=0x0D => Instruction::Fconst((opcode - 0x0B) as f32),
            0x0E | 0x0F => Instruction::Dconst((opcode - 0x0E) as f64),
            0x10 => Instruction::Bipush(cursor.read_i8()?),
            0x11 => Instruction::Sipush(cursor.read_i16()?),
            0x12 => Instruction::Ldc(cursor.read_u8()? as u16),
            0x13 => Instruction::Ldc(cursor.read_u16()?),
            0x14 => Instruction::Ldc2W(cursor.read_u16()?),
            0x15 => Instruction::Iload(cursor.read_u8()? as u16),
            0x16 => Instruction::Lload(cursor.read_u8()? as u16),
            0x17 => Instruction::Fload(cursor.read_u8()? as u16),
            0x18 => Instruction::Dload(cursor.read_u8()? as u16),
            0x19 => Instruction::Aload(cursor.read_u8()? as u16),
            0x1A..=0x1D => Instruction::Iload((opcode - 0x1A) as u16),
            0x1E..=0x21 => Instruction::Lload((opcode - 0x1E) as u16),
            0x22..=0x25 => Instruction::Fload((opcode - 0x22) as u16),
            0x26..=0x29 => Instruction::Dload((opcode - 0x26) as u16),
            0x2A..=0x2D => Instruction::Aload((opcode - 0x2A) as u16),
            0x2E => Instruction::Iaload,
            0x2F => Instruction::Laload,
            0x30 => Instruction::Faload,
            0x31 => Instruction::Daload,
            0x32 => Instruction::Aaload,
            0x33 => Instruction::Baload,
            0x34 => Instruction::Caload,
            0x35 => Instruction::Saload,
            0x36 => Instruction::Istore(cursor.read_u8()? as u16),
            0x37 => Instruction::Lstore(cursor.read_u8()? as u16),
            0x38 => Instruction::Fstore(cursor.read_u8()? as u16),
            0x39 => Instruction::Dstore(cursor.read_u8()? as u16),
            0x3A => Instruction::Astore(cursor.read_u8()? as u16),
            0x3B..=0x3E => Instruction::Istore((opcode - 0x3B) as u16),
            0x3F..=0x42 => Instruction::Lstore((opcode - 0x3F) as u16),
            0x43..=0x46 => Instruction::Fstore((opcode - 0x43) as u16),
            0x47..=0x4A => Instruction::Dstore((opcode - 0x47) as u16),
            0x4B..=0x4E => Instruction::Astore((opcode - 0x4B) as u16),
            0x4F => Instruction::Iastore,
            0x50 => Instruction::Lastore,
            0x51 => Instruction::Fastore,
            0x52 => Instruction::Dastore,
            0x53 => Instruction::Aastore,
            0x54 => Instruction::Bastore,
            0x55 => Instruction::Castore,
            0x56 => Instruction::Sastore,
            0x57 => Instruction::Pop,
            0x58 => Instruction::Pop2,
            0x59 => Instruction::Dup,
            0x5A => Instruction::DupX1,
            0x5B => Instruction::DupX2,
            0x5C => Instruction::Dup2,
            0x5D => Instruction::Dup2X1,
            0x5E => Instruction::Dup2X2,
            0x5F => Instruction::Swap,
            0x60 => Instruction::Iadd,
            0x61 => Instruction::Ladd,
            0x62 => Instruction::Fadd,
            0x63 => Instruction::Dadd,
            0x64 => Instruction::Isub,
            0x65 => Instruction::Lsub,
            0x66 => Instruction::Fsub,
            0x67 => Instruction::Dsub,
            0x68 => Instruction::Imul,
            0x69 => Instruction::Lmul,
            0x6A => Instruction::Fmul,
            0x6B => Instruction::Dmul,
            0x6C => Instruction::Idiv,
            0x6D => Instruction::Ldiv,
            0x6E => Instruction::Fdiv,
            0x6F => Instruction::Ddiv,
            0x70 => Instruction::Irem,
            0x71 => Instruction::Lrem,
            0x72 => Instruction::Frem,
            0x73 => Instruction::Drem,
            0x74 => Instruction::Ineg,
            0x75 => Instruction::Lneg,
            0x76 => Instruction::Fneg,
            0x77 => Instruction::Dneg,
            0x78 => Instruction::Ishl,
            0x79 => Instruction::Lshl,
            0x7A => Instruction::Ishr,
            0x7B => Instruction::Lshr,
            0x7C => Instruction::Iushr,
            0x7D => Instruction::Lushr,
            0x7E => Instruction::Iand,
            0x7F => Instruction::Land,
            0x80 => Instruction::Ior,
            0x81 => Instruction::Lor,
            0x82 => Instruction::Ixor,
            0x83 => Instruction::Lxor,
            0x84 => Instruction::Iinc {
                index: cursor.read_u8()? as u16,
                delta: cursor.read_i8()? as i16,
            },
            0x85 => Instruction::I2l,
            0x86 => Instruction::I2f,
            0x87 => Instruction::I2d,
            0x88 => Instruction::L2i,
            0x89 => Instruction::L2f,
            0x8A => Instruction::L2d,
            0x8B => Instruction::F2i,
            0x8C => Instruction::F2l,
            0x8D => Instruction::F2d,
            0x8E => Instruction::D2i,
            0x8F => Instruction::D2l,
            0x90 => Instruction::D2f,
            0x91 => Instruction::I2b,
            0x92 => Instruction::I2c,
            0x93 => Instruction::I2s,
            0x94 => Instruction::Lcmp,
            0x95 => Instruction::Fcmpl,
            0x96 => Instruction::Fcmpg,
            0x97 => Instruction::Dcmpl,
            0x98 => Instruction::Dcmpg,
            0x99 => Instruction::Ifeq(cursor.read_i16()? as i32),
            0x9A => Instruction::Ifne(cursor.read_i16()? as i32),
            0x9B => Instruction::Iflt(cursor.read_i16()? as i32),
            0x9C => Instruction::Ifge(cursor.read_i16()? as i32),
            0x9D => Instruction::Ifgt(cursor.read_i16()? as i32),
            0x9E => Instruction::Ifle(cursor.read_i16()? as i32),
            0x9F => Instruction::IfIcmpeq(cursor.read_i16()? as i32),
            0xA0 => Instruction::IfIcmpne(cursor.read_i16()? as i32),
            0xA1 => Instruction::IfIcmplt(cursor.read_i16()? as i32),
            0xA2 => Instruction::IfIcmpge(cursor.read_i16()? as i32),
            0xA3 => Instruction::IfIcmpgt(cursor.read_i16()? as i32),
            0xA4 => Instruction::IfIcmple(cursor.read_i16()? as i32),
            0xA5 => Instruction::IfAcmpeq(cursor.read_i16()? as i32),
            0xA6 => Instruction::IfAcmpne(cursor.read_i16()? as i32),
            0xA7 => Instruction::Goto(cursor.read_i16()? as i32),
            0xA8 | 0xA9 | 0xC9 => {
                return Err(JvmError::UnsupportedInstruction("jsr/ret"));
            }
            0xAA => {
                cursor.align4(0)?;
                let default = cursor.read_i32()?;
                let low = cursor.read_i32()?;
                let high = cursor.read_i32()?;
                if low > high {
                    return Err(JvmError::Internal(format!(
                        "tableswitch bounds {low}..{high} at pc {pc}"
                    )));
                }
                let count = (high - low + 1) as usize;
                let mut offsets = Vec::with_capacity(count);
                for _ in 0..count {
                    offsets.push(cursor.read_i32()?);
                }
                Instruction::Tableswitch { default, low, high, offsets }
            }
            0xAB => {
                cursor.align4(0)?;
                let default = cursor.read_i32()?;
                let npairs = cursor.read_i32()?;
                if npairs < 0 {
                    return Err(JvmError::Internal(format!(
                        "lookupswitch pair count {npairs} at pc {pc}"
                    )));
                }
                let mut pairs = Vec::with_capacity(npairs as usize);
                for _ in 0..npairs {
                    pairs.push((cursor.read_i32()?, cursor.read_i32()?));
                }
                Instruction::Lookupswitch { default, pairs }
            }
            0xAC => Instruction::Ireturn,
            0xAD => Instruction::Lreturn,
            0xAE => Instruction::Freturn,
            0xAF => Instruction::Dreturn,
            0xB0 => Instruction::Areturn,
            0xB1 => Instruction::Return,
            0xB2 => Instruction::Getstatic(cursor.read_u16()?),
            0xB3 => Instruction::Putstatic(cursor.read_u16()?),
            0xB4 => Instruction::Getfield(cursor.read_u16()?),
            0xB5 => Instruction::Putfield(cursor.read_u16()?),
            0xB6 => Instruction::Invokevirtual(cursor.read_u16()?),
            0xB7 => Instruction::Invokespecial(cursor.read_u16()?),
            0xB8 => Instruction::Invokestatic(cursor.read_u16()?),
            0xB9 => {
                let index = cursor.read_u16()?;
                // historical count and zero operands
                cursor.read_u8()?;
                cursor.read_u8()?;
                Instruction::Invokeinterface(index)
            }
            0xBA => return Err(JvmError::UnsupportedInstruction("invokedynamic")),
            0xBB => Instruction::New(cursor.read_u16()?),
            0xBC => {
                let atype = cursor.read_u8()?;
                let atype = ArrayType::try_from(atype).map_err(|_| {
                    JvmError::Internal(format!("newarray atype {atype} at pc {pc}"))
                })?;
                Instruction::Newarray(atype)
            }
            0xBD => Instruction::Anewarray(cursor.read_u16()?),
            0xBE => Instruction::Arraylength,
            0xBF => Instruction::Athrow,
            0xC0 => Instruction::Checkcast(cursor.read_u16()?),
            0xC1 => Instruction::Instanceof(cursor.read_u16()?),
            0xC2 => Instruction::Monitorenter,
            0xC3 => Instruction::Monitorexit,
            0xC4 => Self::decode_wide(&mut cursor)?,
            0xC5 => Instruction::Multianewarray {
                index: cursor.read_u16()?,
                dimensions: cursor.read_u8()?,
            },
            0xC6 => Instruction::Ifnull(cursor.read_i16()? as i32),
            0xC7 => Instruction::Ifnonnull(cursor.read_i16()? as i32),
            0xC8 => Instruction::Goto(cursor.read_i32()?),
            0xFE => Instruction::InvokeNative,
            other => return Err(JvmError::UnknownOpcode { opcode: other, pc }),
        };
        Ok((instruction, cursor.position()))
    }

    /// The `wide` prefix widens the index of the next load/store/iinc to
    /// 16 bits. `wide ret` is rejected with the rest of the jsr family.
    fn decode_wide(cursor: &mut Cursor) -> Result<Instruction, JvmError> {
        let opcode = cursor.read_u8()?;
        Ok(match opcode {
            0x15 => Instruction::Iload(cursor.read_u16()?),
            0x16 => Instruction::Lload(cursor.read_u16()?),
            0x17 => Instruction::Fload(cursor.read_u16()?),
            0x18 => Instruction::Dload(cursor.read_u16()?),
            0x19 => Instruction::Aload(cursor.read_u16()?),
            0x36 => Instruction::Istore(cursor.read_u16()?),
            0x37 => Instruction::Lstore(cursor.read_u16()?),
            0x38 => Instruction::Fstore(cursor.read_u16()?),
            0x39 => Instruction::Dstore(cursor.read_u16()?),
            0x3A => Instruction::Astore(cursor.read_u16()?),
            0x84 => Instruction::Iinc { index: cursor.read_u16()?, delta: cursor.read_i16()? },
            0xA9 => return Err(JvmError::UnsupportedInstruction("wide ret")),
            other => {
                return Err(JvmError::UnknownOpcode { opcode: other, pc: cursor.position() });
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_short_forms() {
        let (inst, next) = Instruction::decode(&[0x04], 0).unwrap();
        assert_eq!(inst, Instruction::Iconst(1));
        assert_eq!(next, 1);

        let (inst, _) = Instruction::decode(&[0x2B], 0).unwrap();
        assert_eq!(inst, Instruction::Aload(1));

        let (inst, next) = Instruction::decode(&[0x00, 0x15, 0x07], 1).unwrap();
        assert_eq!(inst, Instruction::Iload(7));
        assert_eq!(next, 3);
    }

    #[test]
    fn immediate_operands_are_signed() {
        let (inst, _) = Instruction::decode(&[0x10, 0xFF], 0).unwrap();
        assert_eq!(inst, Instruction::Bipush(-1));
        let (inst, next) = Instruction::decode(&[0x11, 0xFE, 0x0C], 0).unwrap();
        assert_eq!(inst, Instruction::Sipush(-500));
        assert_eq!(next, 3);
    }

    #[test]
    fn wide_prefix_widens_index_and_rejects_ret() {
        let (inst, next) = Instruction::decode(&[0xC4, 0x15, 0x01, 0x00], 0).unwrap();
        assert_eq!(inst, Instruction::Iload(256));
        assert_eq!(next, 4);

        let (inst, next) = Instruction::decode(&[0xC4, 0x84, 0x01, 0x00, 0xFF, 0x9C], 0).unwrap();
        assert_eq!(inst, Instruction::Iinc { index: 256, delta: -100 });
        assert_eq!(next, 6);

        assert!(matches!(
            Instruction::decode(&[0xC4, 0xA9, 0x00, 0x01], 0),
            Err(JvmError::UnsupportedInstruction("wide ret"))
        ));
    }

    #[test]
    fn tableswitch_pads_to_four_byte_alignment() {
        // opcode at pc 1: one pad byte 0..4-alignment, then default/low/high
        let mut code = vec![0x00, 0xAA];
        code.extend_from_slice(&[0x00, 0x00]); // pad to offset 4
        code.extend_from_slice(&20i32.to_be_bytes());
        code.extend_from_slice(&1i32.to_be_bytes());
        code.extend_from_slice(&1i32.to_be_bytes()); // low == high
        code.extend_from_slice(&8i32.to_be_bytes());
        let (inst, next) = Instruction::decode(&code, 1).unwrap();
        assert_eq!(
            inst,
            Instruction::Tableswitch { default: 20, low: 1, high: 1, offsets: vec![8] }
        );
        assert_eq!(next, code.len());
    }

    #[test]
    fn tableswitch_at_aligned_pc_has_no_padding() {
        let mut code = vec![0x00, 0x00, 0x00, 0xAA];
        code.extend_from_slice(&4i32.to_be_bytes());
        code.extend_from_slice(&0i32.to_be_bytes());
        code.extend_from_slice(&0i32.to_be_bytes());
        code.extend_from_slice(&12i32.to_be_bytes());
        let (inst, _) = Instruction::decode(&code, 3).unwrap();
        assert_eq!(
            inst,
            Instruction::Tableswitch { default: 4, low: 0, high: 0, offsets: vec![12] }
        );
    }

    #[test]
    fn lookupswitch_reads_sorted_pairs() {
        let mut code = vec![0xAB, 0x00, 0x00, 0x00];
        code.extend_from_slice(&99i32.to_be_bytes());
        code.extend_from_slice(&2i32.to_be_bytes());
        code.extend_from_slice(&(-5i32).to_be_bytes());
        code.extend_from_slice(&16i32.to_be_bytes());
        code.extend_from_slice(&77i32.to_be_bytes());
        code.extend_from_slice(&32i32.to_be_bytes());
        let (inst, _) = Instruction::decode(&code, 0).unwrap();
        assert_eq!(
            inst,
            Instruction::Lookupswitch { default: 99, pairs: vec![(-5, 16), (77, 32)] }
        );
    }

    #[test]
    fn goto_w_shares_the_goto_shape() {
        let mut code = vec![0xC8];
        code.extend_from_slice(&(-70000i32).to_be_bytes());
        let (inst, next) = Instruction::decode(&code, 0).unwrap();
        assert_eq!(inst, Instruction::Goto(-70000));
        assert_eq!(next, 5);
    }

    #[test]
    fn invokeinterface_consumes_count_and_zero() {
        let (inst, next) = Instruction::decode(&[0xB9, 0x00, 0x08, 0x02, 0x00], 0).unwrap();
        assert_eq!(inst, Instruction::Invokeinterface(8));
        assert_eq!(next, 5);
    }

    #[test]
    fn unknown_opcodes_are_fatal() {
        assert!(matches!(
            Instruction::decode(&[0xBA, 0x00, 0x01, 0x00, 0x00], 0),
            Err(JvmError::UnsupportedInstruction("invokedynamic"))
        ));
        assert!(matches!(
            Instruction::decode(&[0xCA], 0),
            Err(JvmError::UnknownOpcode { opcode: 0xCA, pc: 0 })
        ));
    }
}
